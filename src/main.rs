#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::twis::{self, Command, Twis};
use embassy_nrf::{Peri, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Instant, Timer};
use static_cell::StaticCell;

use keypad_bridge::bus::{BusEngine, LedWriter};
use keypad_bridge::config::{
    COLS, DISCRETE_KEYS, I2C_ADDRESS, KEY_DEBOUNCE, RING_SLOTS, ROWS, ScanConfig,
    scan_interval,
};
use keypad_bridge::discrete::DiscreteKeys;
use keypad_bridge::key_provision::KeyProvision;
use keypad_bridge::matrix::Matrix;
use keypad_bridge::registers::RegisterBank;
use keypad_bridge::ring::EventRing;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    TWISPI0 => twis::InterruptHandler<peripherals::TWISPI0>;
});

/// Last colour written by the host, as red, green, blue
static LED_COLOR: Signal<CriticalSectionRawMutex, [u8; 3]> = Signal::new();

/// Hands LED writes from the bus task to the indicator task
struct LedSignal;

impl LedWriter for LedSignal {
    fn write_led(&mut self, r: u8, g: u8, b: u8) {
        LED_COLOR.signal([r, g, b]);
    }
}

type KeyMatrix = Matrix<Output<'static>, Input<'static>, Delay, ROWS, COLS>;
type Keys = KeyProvision<'static, Output<'static>, RING_SLOTS>;
type Engine = BusEngine<'static, LedSignal, RING_SLOTS>;

#[embassy_executor::task]
pub async fn run_leds(led_pin: Peri<'static, peripherals::P0_15>) -> ! {
    let mut led = Output::new(led_pin, Level::Low, OutputDrive::Standard);

    loop {
        let [r, g, b] = LED_COLOR.wait().await;
        // single colour indicator, lit while any channel is on
        if r | g | b != 0 {
            led.set_high();
        } else {
            led.set_low();
        }
        info!("[leds] r {} g {} b {}", r, g, b);
    }
}

#[embassy_executor::task]
async fn scan_keys(
    mut matrix: KeyMatrix,
    mut discrete: DiscreteKeys<Input<'static>, DISCRETE_KEYS>,
    mut keys: Keys,
) -> ! {
    loop {
        let now = Instant::now();

        let scanned = matrix
            .scan(now, |position, state| {
                if let Err(e) = keys.on_matrix_key(position, state, now) {
                    warn!("[scan] {}", e);
                }
            })
            .await;
        if let Err(e) = scanned {
            warn!("[scan] matrix: {}", e);
        }

        let scanned = discrete.scan(now, |index, state| {
            if let Err(e) = keys.on_discrete_key(index, state, now) {
                warn!("[scan] {}", e);
            }
        });
        if let Err(e) = scanned {
            warn!("[scan] discrete: {}", e);
        }

        keys.tick(now);

        Timer::after(scan_interval(keys.scan_rate_hz())).await;
    }
}

/// Feed the register engine from the TWIS peripheral.
///
/// The peripheral works on whole transfers, so a read is answered with what
/// is left of the addressed register.
#[embassy_executor::task]
async fn serve_bus(mut twis: Twis<'static, peripherals::TWISPI0>, mut engine: Engine) -> ! {
    let mut rx = [0u8; 8];

    loop {
        match twis.listen(&mut rx).await {
            Ok(Command::Write(len)) => {
                rx[..len].iter().for_each(|byte| engine.on_receive(*byte));
            }
            Ok(Command::WriteRead(len)) => {
                rx[..len].iter().for_each(|byte| engine.on_receive(*byte));
                let reply = engine.read_span();
                if let Err(e) = twis.respond_to_read(&reply).await {
                    warn!("[bus] read failed: {}", e);
                    engine.on_abort();
                    continue;
                }
            }
            Ok(Command::Read) => {
                let reply = engine.read_span();
                if let Err(e) = twis.respond_to_read(&reply).await {
                    warn!("[bus] read failed: {}", e);
                    engine.on_abort();
                    continue;
                }
            }
            Err(e) => {
                warn!("[bus] listen failed: {}", e);
                engine.on_abort();
                continue;
            }
        }
        engine.on_stop();
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // init peripherals
    let p = embassy_nrf::init(Default::default());

    static RING: StaticCell<EventRing<RING_SLOTS>> = StaticCell::new();
    static BANK: StaticCell<RegisterBank> = StaticCell::new();
    let (producer, consumer) = RING.init(EventRing::new()).split();
    let (loop_regs, host_regs) = BANK.init(RegisterBank::new()).split();

    let rows = [
        Output::new(p.P0_02, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_03, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_04, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_05, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_28, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_29, Level::Low, OutputDrive::Standard),
    ];
    let cols = [
        Input::new(p.P0_30, Pull::Down),
        Input::new(p.P0_31, Pull::Down),
        Input::new(p.P1_10, Pull::Down),
        Input::new(p.P1_11, Pull::Down),
        Input::new(p.P1_12, Pull::Down),
        Input::new(p.P1_13, Pull::Down),
        Input::new(p.P1_14, Pull::Down),
    ];
    let matrix = Matrix::init(rows, cols, Delay, ScanConfig::default());

    let discrete = DiscreteKeys::init(
        [
            Input::new(p.P0_06, Pull::Down),
            Input::new(p.P0_07, Pull::Down),
            Input::new(p.P0_08, Pull::Down),
            Input::new(p.P1_01, Pull::Down),
            Input::new(p.P1_02, Pull::Down),
            Input::new(p.P0_11, Pull::Down),
            Input::new(p.P0_12, Pull::Down),
            Input::new(p.P0_13, Pull::Down),
            Input::new(p.P0_14, Pull::Down),
            Input::new(p.P0_16, Pull::Down),
            Input::new(p.P0_17, Pull::Down),
        ],
        KEY_DEBOUNCE,
    );

    // events pending line to the host, idles high
    let irq = Output::new(p.P0_19, Level::High, OutputDrive::Standard);
    let keys = KeyProvision::init(producer, loop_regs, irq);

    let mut config = twis::Config::default();
    config.address0 = I2C_ADDRESS;
    let twis = Twis::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, config);
    let engine = BusEngine::new(consumer, host_regs, LedSignal);

    info!("[main] listening at {=u8:#x}", I2C_ADDRESS);

    spawner.must_spawn(run_leds(p.P0_15));
    spawner.must_spawn(serve_bus(twis, engine));
    spawner.must_spawn(scan_keys(matrix, discrete, keys));
}
