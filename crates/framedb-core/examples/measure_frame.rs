use framedb_core::detect_screen_bounds;
use image::ImageReader;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <frame.png>", args[0]);
        std::process::exit(2);
    }

    let image = ImageReader::open(&args[1])?.decode()?.to_rgba8();
    let bounds = detect_screen_bounds(&image)?;

    println!(
        "Screen bounds: +{}+{}, {}x{} (frame {}x{})",
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
        image.width(),
        image.height()
    );
    Ok(())
}
