use embedded_hal::digital::{InputPin, PinState};
use embedded_hal_async::digital::Wait;

use crate::log;

/// Sample the pin. A read error is logged and reported as `None` so a flaky
/// read costs one poll rather than the task.
pub fn read_level<P: InputPin>(pin: &mut P) -> Option<PinState> {
    match pin.is_high() {
        Ok(high) => Some(PinState::from(high)),
        Err(_) => {
            log::warning!("BUTTON: pin read failed");
            None
        }
    }
}

/// Wait for the pin to change level in either direction
pub async fn wait_for_change<P: Wait>(pin: &mut P) -> Result<(), P::Error> {
    pin.wait_for_any_edge().await
}
