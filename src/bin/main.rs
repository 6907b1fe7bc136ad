#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker};
use esp_hal::{
    Config,
    clock::CpuClock,
    gpio::{Input, InputConfig, Pull},
    timer::systimer::SystemTimer,
};
use embedded_hal::digital::PinState;
use interrupt_button::{
    AsyncConsumer, Button, ButtonConfig, ButtonContext, Event, Mode,
    tasks::{service_async_queue, watch_button},
};
use panic_rtt_target as _;
use static_cell::StaticCell;

/// Menu levels the buttons cycle through
const MENUS: u8 = 3;

/// How often the main loop drains the sync queue
const MAIN_LOOP_PERIOD: Duration = Duration::from_millis(10);

/// Shared by both buttons
static BUTTONS: ButtonContext = ButtonContext::new();

static SELECT_BUTTON: StaticCell<Button<'static>> = StaticCell::new();
static MENU_BUTTON: StaticCell<Button<'static>> = StaticCell::new();

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn select_down() {
    info!("ACTION: select down at menu {}", BUTTONS.menu_level());
}

fn select_up() {
    info!("ACTION: select up at menu {}", BUTTONS.menu_level());
}

fn select_press() {
    info!("ACTION: select pressed at menu {}", BUTTONS.menu_level());
}

fn select_hold() {
    info!("ACTION: select held");
}

fn select_repeat() {
    info!("ACTION: select repeating");
}

fn select_double() {
    info!("ACTION: select double-clicked, back to the top menu");
    if BUTTONS.set_menu_level(0).is_err() {
        warn!("ACTION: menu level rejected");
    }
}

fn next_menu() {
    let level = (BUTTONS.menu_level() + 1) % BUTTONS.menu_count();
    if BUTTONS.set_menu_level(level).is_err() {
        warn!("ACTION: menu level {} rejected", level);
    }
}

#[embassy_executor::task]
async fn dispatch_task(consumer: AsyncConsumer<'static>) {
    service_async_queue(consumer).await
}

#[embassy_executor::task(pool_size = 2)]
async fn button_task(button: &'static Button<'static>, mut pin: Input<'static>) {
    watch_button(button, &mut pin).await
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    #[cfg(all(feature = "rtt", feature = "defmt"))]
    rtt_target::rtt_init_defmt!();

    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));
    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    BUTTONS
        .set_menu_count(MENUS)
        .expect("Menu count set before any button exists");

    // Both buttons pull up and short to ground when pressed
    let config = InputConfig::default().with_pull(Pull::Up);
    let select_pin = Input::new(peripherals.GPIO9, config);
    let menu_pin = Input::new(peripherals.GPIO3, config);

    let select: &Button = SELECT_BUTTON.init(
        Button::new(&BUTTONS, ButtonConfig::new(PinState::Low))
            .expect("Failed to create select button"),
    );
    for level in 0..MENUS {
        select
            .bind_at(Event::KeyDown, level, select_down)
            .and_then(|()| select.bind_at(Event::KeyUp, level, select_up))
            .and_then(|()| select.bind_at(Event::KeyPress, level, select_press))
            .expect("Failed to bind select actions");
    }
    select
        .bind_at(Event::LongKeyPress, 0, select_hold)
        .and_then(|()| select.bind_at(Event::AutoRepeatPress, 0, select_repeat))
        .and_then(|()| select.bind_at(Event::DoubleClick, MENUS - 1, select_double))
        .expect("Failed to bind select gestures");

    let menu: &Button = MENU_BUTTON.init(
        Button::new(
            &BUTTONS,
            ButtonConfig::new(PinState::Low).with_debounce(Duration::from_millis(15)),
        )
        .expect("Failed to create menu button"),
    );
    for level in 0..MENUS {
        menu.bind_at(Event::KeyPress, level, next_menu)
            .expect("Failed to bind menu action");
    }

    // The consumer must be running before the mode sends anything its way
    let consumer = BUTTONS
        .async_consumer()
        .expect("Async consumer already taken");
    spawner
        .spawn(dispatch_task(consumer))
        .expect("Failed to spawn dispatch task");
    BUTTONS
        .set_mode(Mode::Hybrid)
        .expect("Async consumer is running");

    spawner
        .spawn(button_task(select, select_pin))
        .expect("Failed to spawn select button task");
    spawner
        .spawn(button_task(menu, menu_pin))
        .expect("Failed to spawn menu button task");

    info!("MAIN: Starting main loop");
    let mut ticker = Ticker::every(MAIN_LOOP_PERIOD);
    loop {
        BUTTONS.process_sync_events();
        ticker.next().await;
    }
}
