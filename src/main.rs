#![no_std]
#![no_main]

mod leds;
mod pulses;
mod store;
mod ui;

pub use leds::*;
pub use pulses::*;
pub use store::*;
pub use ui::*;

use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::{select, yield_now};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Ticker};
use microbit_bsp::{
    embassy_nrf::{
        gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull},
        interrupt,
        interrupt::{InterruptExt, Priority},
        nvmc::Nvmc,
        pac, peripherals, timer,
    },
    Button, Microbit,
};

use ledctl::{
    bcm::CYCLE_TICKS, tick::TICK_PERIOD_US, Engine, FlashStore, Frame, FrameScheduler, Menu,
    MenuEvent, Mode, PulseCapture, Settings, Shared, Storage, INPUTS, OUTPUTS,
};

static SHARED: Shared = Shared::new();

/// Runs pulse capture and the tick source above the main loop.
static PRIORITY_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI1_EGU1() {
    PRIORITY_EXECUTOR.on_interrupt()
}

#[embassy_executor::task]
async fn ticks() {
    let mut ticker = Ticker::every(Duration::from_micros(TICK_PERIOD_US));
    loop {
        ticker.next().await;
        SHARED.ticks.on_tick();
    }
}

fn log_moved<S: Storage>(engine: &Engine<'_, S>, moved: u8) {
    for input in (0..INPUTS).filter(|i| moved & (1 << i) != 0) {
        let channel = engine.calibrator().input(input);
        rprintln!(
            "input {}: bounds {}..{} divisor {}",
            input,
            channel.min,
            channel.max,
            channel.divisor
        );
    }
}

async fn main_loop<S: Storage>(mut engine: Engine<'static, S>, mut ui: Option<Ui>) -> ! {
    loop {
        match engine.service_inputs() {
            Ok(0) => (),
            Ok(moved) => log_moved(&engine, moved),
            Err(err) => rprintln!("calibration: storage write failed: {:?}", err),
        }
        match ui.as_mut() {
            Some(ui) => ui.poll(&mut engine),
            None => {
                engine.render();
            }
        }
        yield_now().await;
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_init_print!();
    let board = Microbit::default();

    // SAFETY: the board support crate does not hand out TIMER1 or TIMER2,
    // and nothing else in the firmware uses them.
    let (frame_timer, capture_clock) =
        unsafe { (peripherals::TIMER1::steal(), peripherals::TIMER2::steal()) };

    let led_pin = |p| Output::new(p, Level::Low, OutputDrive::Standard);
    let leds = Leds::new(
        [
            led_pin(AnyPin::from(board.p8)),
            led_pin(AnyPin::from(board.p9)),
            led_pin(AnyPin::from(board.p12)),
            led_pin(AnyPin::from(board.p13)),
            led_pin(AnyPin::from(board.p14)),
            led_pin(AnyPin::from(board.p15)),
            led_pin(AnyPin::from(board.p16)),
        ],
        timer::Timer::new(frame_timer),
    );

    let pulse_pin = |p| Input::new(p, Pull::None);
    let pulses = Pulses::new(
        [
            pulse_pin(AnyPin::from(board.p0)),
            pulse_pin(AnyPin::from(board.p1)),
            pulse_pin(AnyPin::from(board.p2)),
        ],
        timer::Timer::new(capture_clock),
    );

    let store = match NvmcStore::new(Nvmc::new(board.nvmc)) {
        Ok(store) => store,
        Err(err) => panic!("settings: flash read failed: {:?}", err),
    };
    let settings = match Settings::load(store) {
        Ok(settings) => settings,
        Err(err) => panic!("settings: load failed: {:?}", err),
    };
    for (led, config) in settings.outputs().iter().enumerate() {
        rprintln!("led {}: {:?}", led, config);
    }
    for input in 0..INPUTS {
        let bounds = settings.bounds(input);
        rprintln!("input {}: bounds {}..{}", input, bounds.min, bounds.max);
    }

    // Holding A at boot enters setup, which is also when inputs calibrate.
    let setup = board.btn_a.is_low();
    let ui = if setup {
        rprintln!("setup mode: calibrating inputs");
        Some(Ui::new(board.btn_a))
    } else {
        rprintln!("normal mode");
        None
    };
    let mode = if setup { Mode::Calibrating } else { Mode::Normal };
    let engine = Engine::new(&SHARED, settings, mode);
    SHARED.ticks.reset_all();

    leds.start();
    interrupt::SWI1_EGU1.set_priority(Priority::P2);
    let spawner = PRIORITY_EXECUTOR.start(interrupt::SWI1_EGU1);
    spawner.must_spawn(capture_pulses(pulses));
    spawner.must_spawn(ticks());

    main_loop(engine, ui).await
}
