use std::env;
use std::path::Path;

use anyhow::{anyhow, Context};
use linux_embedded_hal::I2cdev;

use ov2640::register::{sensor, Bank};
use ov2640::resolution::{resolve, FrameSize};
use ov2640::sccb::{Sccb, DEFAULT_ADDRESS};
use ov2640::settings::Colorspace;
use ov2640::window::{window_registers, ClockSettings};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        return Err(anyhow!("Arguments: <I2C bus> [sensor address]"));
    }
    let address: u8 = match args.get(2) {
        Some(arg) if arg.starts_with("0x") => {
            let hex_digits = arg.split_at(2).1;
            u8::from_str_radix(hex_digits, 16)?
        }
        Some(arg) => arg.parse()?,
        None => DEFAULT_ADDRESS,
    };
    let bus_path = Path::new(&args[1]);
    let bus = I2cdev::new(bus_path)
        .with_context(|| format!("{} should be an I2C device", bus_path.display()))?;
    let mut sccb = Sccb::new(bus, address);
    let product_id = sccb.read_bank_register(Bank::Sensor, sensor::REG_PID)?;
    let version = sccb.read_bank_register(Bank::Sensor, sensor::REG_VER)?;
    println!(
        "Sensor at {:#04x}: PID {:#04x}, VER {:#04x}",
        address, product_id, version
    );
    if product_id != 0x26 {
        println!("This doesn't look like an OV2640");
    }

    println!("Window settings per frame size:");
    for size in FrameSize::ALL.iter() {
        let geometry = resolve(*size);
        let clocks = ClockSettings::new(geometry.mode, Colorspace::Rgb565);
        print!(
            "{:?}: {}x{} {:?} R_DVP_SP={:#04x}",
            size,
            geometry.width,
            geometry.height,
            geometry.mode,
            clocks.r_dvp_sp()
        );
        for (register, value) in window_registers(&geometry).iter().skip(1) {
            print!(" {:02x}={:02x}", register, value);
        }
        println!();
    }
    Ok(())
}
