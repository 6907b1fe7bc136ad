use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};
use embedded_hal::digital::{InputPin, PinState};
use embedded_hal_async::digital::Wait;

use crate::Button;
use crate::drivers::button::{read_level, wait_for_change};
use crate::log;

/// Drive `button` from `pin` forever.
///
/// Edges start debounce polling. While polling, edges are ignored and only
/// the poll timer is awaited. Otherwise the task waits for whichever comes
/// first, an edge or the long press / double-click deadline.
pub async fn watch_button<P, const MENUS: usize>(button: &Button<'_, MENUS>, pin: &mut P)
where
    P: InputPin + Wait,
{
    log::info!("BUTTON_TASK: Task started");
    loop {
        if !button.is_polling() {
            // The level may have moved after polling stopped and before we
            // started listening for edges again
            let level = current_level(button, pin);
            button.resync(Instant::now(), level);
        }

        match button.next_deadline() {
            Some(deadline) if button.is_polling() => {
                Timer::at(deadline).await;
                service(button, pin);
            }
            Some(deadline) => match select(wait_for_change(pin), Timer::at(deadline)).await {
                Either::First(edge) => {
                    if edge.is_err() {
                        log::warning!("BUTTON_TASK: Edge wait failed, polling instead");
                    }
                    button.on_pin_change(Instant::now());
                }
                Either::Second(()) => service(button, pin),
            },
            None => {
                if wait_for_change(pin).await.is_err() {
                    log::warning!("BUTTON_TASK: Edge wait failed, polling instead");
                }
                button.on_pin_change(Instant::now());
            }
        }
    }
}

fn service<P: InputPin, const MENUS: usize>(button: &Button<'_, MENUS>, pin: &mut P) {
    let level = current_level(button, pin);
    button.service(Instant::now(), level);
}

/// A failed read counts as agreeing with the debounced state
fn current_level<P: InputPin, const MENUS: usize>(button: &Button<'_, MENUS>, pin: &mut P) -> PinState {
    read_level(pin).unwrap_or_else(|| {
        if button.is_pressed() {
            button.pressed_level()
        } else {
            !button.pressed_level()
        }
    })
}
