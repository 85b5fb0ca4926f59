use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ration_control::{FixedShareFormulator, LineSource};
use ration_core::{
    AnimalId, BalanceReport, BalanceStatus, GrowingParams, GrowingRow, IngredientCatalog,
    LactationParams, LactationRequirements, Nutrient, NutrientSet, RationEngine, RationLine,
    RationRecord, RationRequirements, ReferenceRow, ReferenceTables, Resolution, TableKind,
};
use ration_world::{load_content_with_overrides, RationContent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "ration_cli", about = "NRC cattle ration calculator")]
struct Cli {
    #[arg(long, global = true, default_value = "./content")]
    content_dir: String,
    /// JSON object of constant overrides, e.g. {"deficient_below_pct": 85}.
    #[arg(long, global = true)]
    overrides: Option<String>,
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RationKind {
    Lactation,
    Growing,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily requirements of a lactating cow.
    Lactation {
        #[arg(long)]
        weight: Decimal,
        #[arg(long)]
        milk: Decimal,
        #[arg(long)]
        fat: Decimal,
        #[arg(long, default_value_t = 0)]
        gestation_days: u32,
    },
    /// Requirements of a growing/finishing animal from the band table.
    Growing {
        #[arg(long)]
        weight: Decimal,
        #[arg(long)]
        gain: Option<Decimal>,
    },
    /// Look up a single reference row.
    Lookup {
        /// maintenance, production, gestation or growing.
        table: TableKind,
        /// Body weight (kg) or milk fat (%) for production.
        #[arg(long)]
        key: Decimal,
        /// Daily gain for the growing table.
        #[arg(long)]
        gain: Option<Decimal>,
    },
    /// Propose a fixed-share starting ration from the catalog.
    Formulate {
        /// Total ration mass in kg. Defaults to `default_ration_kg`.
        #[arg(long)]
        total: Option<Decimal>,
    },
    /// Evaluate a ration against an animal's requirements.
    Evaluate {
        #[arg(long, value_enum)]
        kind: RationKind,
        #[arg(long)]
        weight: Decimal,
        #[arg(long, required_if_eq("kind", "lactation"))]
        milk: Option<Decimal>,
        #[arg(long, required_if_eq("kind", "lactation"))]
        fat: Option<Decimal>,
        #[arg(long, default_value_t = 0)]
        gestation_days: u32,
        #[arg(long)]
        gain: Option<Decimal>,
        /// JSON file with ration lines. Mutually exclusive with --auto.
        #[arg(long, conflicts_with = "auto", required_unless_present = "auto")]
        ration: Option<String>,
        /// Evaluate a fixed-share ration of this many kg.
        #[arg(long, conflicts_with = "ration")]
        auto: Option<Decimal>,
        #[arg(long)]
        animal: Option<String>,
    },
}

/// A ration file holds either a bare array of lines or `{"lines": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RationFile {
    Lines(Vec<RationLine>),
    Wrapped { lines: Vec<RationLine> },
}

impl RationFile {
    fn into_lines(self) -> Vec<RationLine> {
        match self {
            RationFile::Lines(lines) | RationFile::Wrapped { lines } => lines,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output")?
    );
    Ok(())
}

fn engine(content: &RationContent) -> RationEngine<'_, ReferenceTables, IngredientCatalog> {
    RationEngine::new(&content.tables, &content.ingredients, &content.constants)
}

fn lactation(content: &RationContent, params: LactationParams, json: bool) -> Result<()> {
    let req = engine(content).requirements().lactation(params)?;
    if json {
        return print_json(&req);
    }
    print_lactation(&req);
    Ok(())
}

fn growing(content: &RationContent, params: GrowingParams, json: bool) -> Result<()> {
    let row = engine(content).requirements().growing(params)?;
    if json {
        return print_json(&row);
    }
    print_growing_row(&row);
    Ok(())
}

fn lookup(
    content: &RationContent,
    table: TableKind,
    key: Decimal,
    gain: Option<Decimal>,
    json: bool,
) -> Result<()> {
    let (row, resolution) = content.tables.lookup(table, key, gain)?;
    if json {
        return print_json(&serde_json::json!({ "row": row, "resolution": resolution }));
    }
    match resolution {
        Resolution::Exact => println!("{table} {key}: exact row"),
        Resolution::Interpolated {
            lower_key,
            upper_key,
        } => println!("{table} {key}: interpolated between {lower_key} and {upper_key}"),
        Resolution::ClampedLow => println!("{table} {key}: below table, using first row"),
        Resolution::ClampedHigh => println!("{table} {key}: above table, using last row"),
    }
    match row {
        ReferenceRow::Maintenance(r) => print_nutrients(&r.nutrients),
        ReferenceRow::Production(r) => print_nutrients(&r.nutrients),
        ReferenceRow::Gestation(r) => print_nutrients(&r.nutrients),
        ReferenceRow::Growing(r) => print_growing_row(&r),
    }
    Ok(())
}

fn formulate(content: &RationContent, total: Option<Decimal>, json: bool) -> Result<()> {
    let total = total.unwrap_or(content.constants.default_ration_kg);
    let lines = FixedShareFormulator.propose_lines(&content.ingredients, &content.constants, total);
    if json {
        return print_json(&lines);
    }
    if lines.is_empty() {
        println!("No usable ingredients for a {total} kg ration.");
        return Ok(());
    }
    println!("{:<24} {:>10} {:>8}", "ingredient", "kg", "%");
    for line in &lines {
        println!(
            "{:<24} {:>10} {:>8}",
            line.ingredient_id.0, line.quantity_kg, line.percentage
        );
    }
    Ok(())
}

struct EvaluateArgs {
    kind: RationKind,
    weight: Decimal,
    milk: Option<Decimal>,
    fat: Option<Decimal>,
    gestation_days: u32,
    gain: Option<Decimal>,
    ration: Option<String>,
    auto: Option<Decimal>,
    animal: Option<String>,
}

fn read_lines(content: &RationContent, args: &EvaluateArgs) -> Result<Vec<RationLine>> {
    if let Some(total) = args.auto {
        return Ok(FixedShareFormulator.propose_lines(
            &content.ingredients,
            &content.constants,
            total,
        ));
    }
    let Some(path) = &args.ration else {
        anyhow::bail!("either --ration or --auto is required");
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ration file: {path}"))?;
    let file: RationFile =
        serde_json::from_str(&text).with_context(|| format!("parsing ration file: {path}"))?;
    Ok(file.into_lines())
}

fn evaluate(content: &RationContent, args: &EvaluateArgs, json: bool) -> Result<()> {
    let lines = read_lines(content, args)?;
    let animal_id = args.animal.clone().map(AnimalId);
    let engine = engine(content);
    let record = match args.kind {
        RationKind::Lactation => engine.lactation_ration(
            animal_id,
            LactationParams {
                weight_kg: args.weight,
                milk_yield_kg: args.milk.unwrap_or(Decimal::ZERO),
                fat_pct: args.fat.context("--fat is required for lactation")?,
                gestation_days: args.gestation_days,
            },
            lines,
        )?,
        RationKind::Growing => engine.growing_ration(
            animal_id,
            GrowingParams {
                weight_kg: args.weight,
                target_daily_gain_kg: args.gain,
            },
            lines,
        )?,
    };
    if json {
        return print_json(&record);
    }
    print_record(&record);
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_nutrients(set: &NutrientSet) {
    for (nutrient, value) in set.iter() {
        println!("  {:<22} {:>10.3} {}", nutrient.label(), value, nutrient.unit());
    }
}

fn print_lactation(req: &LactationRequirements) {
    let p = &req.params;
    println!(
        "Cow {} kg, {} kg milk at {}% fat, {} days pregnant",
        p.weight_kg, p.milk_yield_kg, p.fat_pct, p.gestation_days
    );
    println!(
        "  {:<22} {:>10} {:>10} {:>10} {:>10}",
        "nutrient", "maint.", "milk", "gest.", "total"
    );
    for nutrient in Nutrient::ALL {
        println!(
            "  {:<22} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            nutrient.label(),
            req.base.get(nutrient),
            req.production.get(nutrient),
            req.gestation.get(nutrient),
            req.totals.get(nutrient),
        );
    }
    if !req.gestation_applied {
        println!("  (gestation not yet in its final stage; no gestation allowance)");
    }
}

fn print_growing_row(row: &GrowingRow) {
    println!(
        "Band {}–{} kg, {}–{} kg/day",
        row.weight_min_kg, row.weight_max_kg, row.gain_min_kg, row.gain_max_kg
    );
    println!("  crude protein        {:>8} g", row.crude_protein_g);
    println!("  digestible protein   {:>8} g", row.digestible_protein_g);
    println!("  metabolizable energy {:>8} Mcal", row.metabolizable_energy_mcal);
    println!("  calcium              {:>8} g", row.calcium_g);
    println!("  phosphorus           {:>8} g", row.phosphorus_g);
    println!("  dry matter           {:>8} kg", row.dry_matter_kg);
}

fn status_label(status: BalanceStatus) -> &'static str {
    match status {
        BalanceStatus::Deficient => "DEFICIENT",
        BalanceStatus::Adequate => "ok",
        BalanceStatus::Excess => "EXCESS",
        BalanceStatus::NoRequirement => "-",
        BalanceStatus::NoData => "no data",
    }
}

fn print_balance(report: &BalanceReport) {
    println!(
        "  {:<22} {:>10} {:>10} {:>9}  status",
        "nutrient", "required", "supplied", "coverage"
    );
    for b in &report.nutrients {
        let mark = if b.lower_bound { "≥" } else { " " };
        println!(
            "  {:<22} {:>10.3} {mark}{:>9.3} {:>8.1}%  {}",
            b.nutrient.label(),
            b.required,
            b.supplied,
            b.coverage_pct,
            status_label(b.status),
        );
    }
    println!(
        "Rating: {:?} ({} deficient, {} in excess)",
        report.rating, report.deficient_count, report.excess_count
    );
    for advice in report.advice() {
        println!("  * {advice}");
    }
}

fn print_record(record: &RationRecord) {
    match &record.requirements {
        RationRequirements::Lactation(req) => print_lactation(req),
        RationRequirements::Growing { row, .. } => print_growing_row(row),
    }
    let (Some(contributions), Some(balance)) = (&record.contributions, &record.balance) else {
        println!("No ration lines; requirements only.");
        return;
    };
    println!();
    println!(
        "Ration: {} lines, {} kg fed, cost {}",
        record.lines.len(),
        contributions.fed_kg,
        contributions.cost_total
    );
    for warning in &contributions.warnings {
        println!(
            "  ! line {} ({}) has no active analysis and supplies nothing",
            warning.line_index + 1,
            warning.ingredient_id
        );
    }
    print_balance(balance);
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let content = load_content_with_overrides(&cli.content_dir, cli.overrides.as_deref())?;
    match cli.command {
        Commands::Lactation {
            weight,
            milk,
            fat,
            gestation_days,
        } => lactation(
            &content,
            LactationParams {
                weight_kg: weight,
                milk_yield_kg: milk,
                fat_pct: fat,
                gestation_days,
            },
            cli.json,
        ),
        Commands::Growing { weight, gain } => growing(
            &content,
            GrowingParams {
                weight_kg: weight,
                target_daily_gain_kg: gain,
            },
            cli.json,
        ),
        Commands::Lookup { table, key, gain } => lookup(&content, table, key, gain, cli.json),
        Commands::Formulate { total } => formulate(&content, total, cli.json),
        Commands::Evaluate {
            kind,
            weight,
            milk,
            fat,
            gestation_days,
            gain,
            ration,
            auto,
            animal,
        } => evaluate(
            &content,
            &EvaluateArgs {
                kind,
                weight,
                milk,
                fat,
                gestation_days,
                gain,
                ration,
                auto,
                animal,
            },
            cli.json,
        ),
    }
}
