//! # Plate Calc
//!
//! A standalone CLI for the microplate operation framework.
//! Generates random integer plates, applies a named elementwise operation in
//! lenient or strict mode (optionally restricted to an index window) and
//! prints the result.
//!
//! ## Alignment model
//!
//! ```text
//! lenient:  wells in only one plate pass through, longer tails are copied
//! strict:   only wells in both plates survive, tails are dropped
//! ranged:   every surviving well is cut to [begin, begin + length)
//! ```

use std::str::FromStr;

use clap::{Parser, Subcommand};
use colored::*;
use microplate_ops::{
    catalog, BigDecimal, BigInt, BinaryOperation, Coordinate, IntegerPlate, MathContext, OpError,
    Plate, PlateFormat, PlateGenerator, Policy, Rounding, Scalar, UnaryOperation, Well,
};
use tracing::{debug, warn};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "plate-calc")]
#[command(about = "Elementwise arithmetic and bitwise operations over microplates")]
#[command(version)]
struct Cli {
    /// Show framework diagnostics (alignment counts, stack remainders)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through the alignment scenarios on small hand-made data
    Demo,
    /// Apply an operation to two random plates (one full, one sparse)
    Apply {
        /// Operation name, e.g. add, xor, shift_left
        #[arg(long)]
        op: String,
        /// Plate format: 6, 12, 24, 48, 96, 384 or 1536 wells
        #[arg(long, default_value = "96")]
        format: String,
        /// Drop wells and tails not present in both plates
        #[arg(long)]
        strict: bool,
        /// First index of the window
        #[arg(long, requires = "length")]
        begin: Option<usize>,
        /// Window length
        #[arg(long, requires = "begin")]
        length: Option<usize>,
        /// Shift distance or increment step for parameterised operations
        #[arg(long, default_value_t = 1)]
        amount: u32,
        /// Values per well
        #[arg(long, default_value_t = 6)]
        values: usize,
        /// Seed for reproducible plates
        #[arg(long)]
        seed: Option<u64>,
        /// Emit the result plate as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the supported plate formats
    Formats,
}

const BINARY_OPS: [&str; 9] = [
    "add", "subtract", "multiply", "minimum", "maximum", "and", "or", "xor", "and_not",
];
const UNARY_OPS: [&str; 7] = [
    "negate",
    "absolute",
    "increment",
    "decrement",
    "not",
    "shift_left",
    "shift_right",
];

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn show_well<T: std::fmt::Display>(label: &str, well: &Well<T>) {
    println!("  {:<10} {}", label.bright_magenta(), well);
}

fn show_plate<T: std::fmt::Display>(title: &str, plate: &Plate<T>, limit: usize) {
    let border = "─".repeat(56);
    println!("  ┌{}┐", border);
    let shape = match plate.format() {
        Some(format) => format.to_string(),
        None => format!("{} × {}", plate.rows(), plate.columns()),
    };
    println!(
        "  │ {:^54} │",
        format!("{} ({}, {} wells)", title, shape, plate.len())
            .bright_yellow()
            .to_string()
    );
    println!("  ├{}┤", border);

    if plate.is_empty() {
        println!("  │ {:^54} │", "(no wells)".dimmed().to_string());
    }
    for well in plate.iter().take(limit) {
        let mut line = well.to_string();
        if line.chars().count() > 54 {
            line = line.chars().take(51).collect::<String>() + "...";
        }
        println!("  │ {:<54} │", line);
    }
    if plate.len() > limit {
        println!(
            "  │ {:<54} │",
            format!("... {} more", plate.len() - limit).dimmed().to_string()
        );
    }
    println!("  └{}┘", border);
}

fn failure(err: &OpError) {
    println!("\n  {} {}", "✗".bright_red().bold(), err.to_string().bright_red());
}

// ─── Demo ──────────────────────────────────────────────────────────────────

fn ints(values: &[i64]) -> Vec<BigInt> {
    values.iter().map(|&v| BigInt::from(v)).collect()
}

fn run_demo() -> microplate_ops::Result<()> {
    header("DEMO — Lenient and Strict Elementwise Operations");
    let ctx = MathContext::unlimited();
    let add = catalog::add(ctx);

    section("Scenario 1: wells of equal length");
    let a = Well::new(0, 0, ints(&[1, 2, 3]));
    let b = Well::new(0, 0, ints(&[10, 20, 30]));
    show_well("a", &a);
    show_well("b", &b);
    show_well("a + b", &add.wells(&a, &b)?);

    section("Scenario 2: wells of different length");
    let a = Well::new(0, 0, ints(&[1, 2, 3, 4]));
    let b = Well::new(0, 0, ints(&[10, 20]));
    show_well("a", &a);
    show_well("b", &b);
    show_well("lenient", &add.wells(&a, &b)?);
    show_well("strict", &add.wells_strict(&a, &b)?);
    step("lenient copies the longer tail, strict stops at the shorter well");

    section("Scenario 3: plates holding different wells");
    let pa = Plate::from_wells(
        8,
        12,
        vec![Well::new(0, 0, ints(&[1])), Well::new(0, 1, ints(&[2]))],
    )?;
    let pb = Plate::from_wells(
        8,
        12,
        vec![Well::new(0, 1, ints(&[10])), Well::new(0, 2, ints(&[20]))],
    )?;
    show_plate("A", &pa, 8);
    show_plate("B", &pb, 8);
    show_plate("A + B (lenient)", &add.plates(&pa, &pb)?, 8);
    show_plate("A + B (strict)", &add.plates_strict(&pa, &pb)?, 8);
    step("A1 and A3 pass through when lenient; only A2 survives when strict");

    section("Scenario 4: shift right by one");
    let a = Well::new(0, 0, ints(&[4, 6, 9]));
    show_well("a", &a);
    show_well("a >> 1", &catalog::shift_right(1).wells(&a)?);

    section("Scenario 5: ranged and scalar operands");
    let a = Well::new(0, 0, ints(&[1, 2, 3, 4]));
    show_well("a", &a);
    show_well("a[1..3] + 100", &add.ranged(1, 2).wells(&a, &Scalar(BigInt::from(100)))?);
    show_well("a * [2, 2]", &catalog::multiply(ctx).wells(&a, &ints(&[2, 2]))?);
    match add.ranged(3, 5).wells(&a, &Scalar(BigInt::from(1))) {
        Ok(well) => show_well("a[3..8]", &well),
        Err(err) => step(&format!("a[3..8] is rejected: {}", err)),
    }

    section("Scenario 6: decimals rounded to 4 significant digits");
    let ctx4 = MathContext::new(4, Rounding::HalfEven)?;
    let decimals = ["3.14159", "2.71828", "1.41421"]
        .iter()
        .filter_map(|s| BigDecimal::from_str(s).ok());
    let d = Well::new(1, 1, decimals);
    show_well("d", &d);
    show_well("d * 3", &catalog::multiply(ctx4).wells(&d, &Scalar(BigDecimal::from(3)))?);
    Ok(())
}

// ─── Apply ─────────────────────────────────────────────────────────────────

struct ApplyArgs {
    op: String,
    format: PlateFormat,
    policy: Policy,
    amount: u32,
    values: usize,
    seed: Option<u64>,
    json: bool,
}

fn binary<F>(
    op: &BinaryOperation<F>,
    a: &IntegerPlate,
    b: &IntegerPlate,
    policy: Policy,
) -> microplate_ops::Result<IntegerPlate>
where
    F: Fn(&BigInt, &BigInt) -> BigInt,
{
    op.with_policy(policy).plates(a, b)
}

fn unary<F>(
    op: &UnaryOperation<F>,
    a: &IntegerPlate,
    policy: Policy,
) -> microplate_ops::Result<IntegerPlate>
where
    F: Fn(&BigInt) -> BigInt,
{
    match policy.window {
        Some(window) => op.plates_range(a, window.begin, window.length),
        None => op.plates(a),
    }
}

/// `None` when the operation name is unknown.
fn dispatch(
    args: &ApplyArgs,
    a: &IntegerPlate,
    b: &IntegerPlate,
) -> Option<microplate_ops::Result<IntegerPlate>> {
    let ctx = MathContext::unlimited();
    let policy = args.policy;
    let delta = i64::from(args.amount);
    let result = match args.op.as_str() {
        "add" => binary(&catalog::add(ctx), a, b, policy),
        "subtract" => binary(&catalog::subtract(ctx), a, b, policy),
        "multiply" => binary(&catalog::multiply(ctx), a, b, policy),
        "minimum" => binary(&catalog::minimum(), a, b, policy),
        "maximum" => binary(&catalog::maximum(), a, b, policy),
        "and" => binary(&catalog::and(), a, b, policy),
        "or" => binary(&catalog::or(), a, b, policy),
        "xor" => binary(&catalog::xor(), a, b, policy),
        "and_not" => binary(&catalog::and_not(), a, b, policy),
        "negate" => unary(&catalog::negate(), a, policy),
        "absolute" => unary(&catalog::absolute(), a, policy),
        "increment" => unary(&catalog::increment(delta, ctx), a, policy),
        "decrement" => unary(&catalog::decrement(delta, ctx), a, policy),
        "not" => unary(&catalog::not(), a, policy),
        "shift_left" => unary(&catalog::shift_left(args.amount), a, policy),
        "shift_right" => unary(&catalog::shift_right(args.amount), a, policy),
        _ => return None,
    };
    Some(result)
}

fn to_json(plate: &IntegerPlate) -> serde_json::Value {
    let wells: serde_json::Map<String, serde_json::Value> = plate
        .iter()
        .map(|well| {
            let values = well.iter().map(|v| serde_json::Value::String(v.to_string())).collect();
            (well.label(), serde_json::Value::Array(values))
        })
        .collect();
    serde_json::json!({
        "rows": plate.rows(),
        "columns": plate.columns(),
        "wells": wells,
    })
}

fn run_apply(args: ApplyArgs) -> microplate_ops::Result<()> {
    header(&format!("APPLY — {} on {} plates", args.op, args.format));

    let mut generator = PlateGenerator::new(args.format)
        .values_per_well(args.values)
        .value_range(-500, 500);
    if let Some(seed) = args.seed {
        generator = generator.seeded(seed);
    }

    section("Operands");
    let a = generator.integer_plate()?;
    let b = generator.sparse_integer_plate(0.5)?;
    show_plate("A (full)", &a, 4);
    show_plate("B (sparse)", &b, 4);

    let mode = if args.policy.is_strict() { "strict" } else { "lenient" };
    section(&format!("Result ({})", mode));
    debug!(op = %args.op, mode, window = ?args.policy.window, "applying operation");

    let result = match dispatch(&args, &a, &b) {
        Some(result) => result?,
        None => {
            warn!(op = %args.op, "unknown operation");
            println!(
                "  {} Unknown operation '{}'",
                "?".bright_yellow(),
                args.op
            );
            step(&format!("binary: {}", BINARY_OPS.join(", ")));
            step(&format!("unary:  {}", UNARY_OPS.join(", ")));
            return Ok(());
        }
    };
    show_plate(&args.op, &result, 8);

    let first = Coordinate::new(0, 0);
    if let (Some(input), Some(output)) = (a.get(&first), result.get(&first)) {
        step(&format!("{} → {}", input, output));
    }
    step(&format!(
        "{} wells in, {} wells out",
        a.data_set().union(b.data_set()).len(),
        result.len()
    ));

    if args.json {
        section("JSON");
        match serde_json::to_string_pretty(&to_json(&result)) {
            Ok(text) => println!("{}", text),
            Err(err) => warn!(%err, "failed to encode result"),
        }
    }
    Ok(())
}

// ─── Formats ───────────────────────────────────────────────────────────────

fn run_formats() {
    header("FORMATS — Supported Plate Layouts");
    for format in PlateFormat::ALL {
        let last = Coordinate::new(format.rows() - 1, format.columns() - 1);
        step(&format!(
            "{:<10} {:>2} × {:<2}  A1 … {}",
            format.to_string(),
            format.rows(),
            format.columns(),
            last
        ));
    }
}

// ─── Entry point ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Demo => run_demo(),
        Commands::Apply {
            op,
            format,
            strict,
            begin,
            length,
            amount,
            values,
            seed,
            json,
        } => {
            let format = match PlateFormat::from_str(&format) {
                Ok(format) => format,
                Err(err) => {
                    warn!(format = %format, "unusable plate format");
                    println!("  {} {}", "!".bright_red(), err);
                    std::process::exit(2);
                }
            };
            let mut policy = if strict { Policy::strict() } else { Policy::lenient() };
            if let (Some(begin), Some(length)) = (begin, length) {
                policy = policy.with_window(begin, length);
            }
            run_apply(ApplyArgs {
                op,
                format,
                policy,
                amount,
                values,
                seed,
                json,
            })
        }
        Commands::Formats => {
            run_formats();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        failure(&err);
        std::process::exit(1);
    }
}
