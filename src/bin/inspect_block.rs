use std::{env, fs, path::Path, process::exit};
use wasdeparser::process::block::{BlockParser, BlockState, Step};

fn main() {
    // Expect a bulletin path and an optional commodity label.
    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <BULLETIN_TXT> [LABEL]", args[0]);
        exit(1);
    }
    let label = args.get(2).map(String::as_str).unwrap_or("Wheat");
    if let Err(e) = inspect_block(Path::new(&args[1]), label) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Walk the bulletin through the block parser and print what every line in
/// and around the commodity block did.
fn inspect_block(path: &Path, label: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let mut parser = BlockParser::new(label);

    println!("=== Bulletin: {} (label `{}`) ===", path.display(), label);
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let counter = match parser.state() {
            BlockState::InBlock(c) => Some(c),
            _ => None,
        };
        let step = match parser.feed(line_no, line) {
            Ok(step) => step,
            Err(e) => {
                println!("{:>5} | {:<14} | MALFORMED: {}", line_no, "-", e);
                break;
            }
        };
        let what = match &step {
            Step::Ignored => continue,
            Step::Opened => "opened".to_string(),
            Step::CapturedYear(y) => format!("year {}", y),
            Step::Emitted(t) => t.to_string(),
            Step::Closed => "closed".to_string(),
        };
        let slot = counter
            .map(|c| format!("{}:{:?}", c.get(), c.slot()))
            .unwrap_or_else(|| "-".into());
        println!("{:>5} | {:<14} | {:<10} | {}", line_no, slot, what, line.trim_end());
        if step == Step::Closed {
            break;
        }
    }

    match parser.finish() {
        None => println!("\nlabel `{}` not found", label),
        Some(block) => {
            println!(
                "\n{} lines in block, {} rows emitted",
                block.lines_in_block,
                block.rows.len()
            );
            for flag in &block.flags {
                println!("flag: {}", flag);
            }
        }
    }
    Ok(())
}
