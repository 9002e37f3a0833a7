//! Writes a small dataset library and a matching catalog for trying the
//! browser out:
//!
//! ```text
//! <out>/catalog.csv           dataset_id, title, title_es
//! <out>/datasets/index.csv    Item, Title
//! <out>/datasets/flowers.parquet, cars.csv, survey.json (+ docs)
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(about = "Generate a sample catalog and dataset library")]
struct Args {
    /// Output directory
    #[arg(long, default_value = "sample")]
    out: PathBuf,
}

/// Deterministic linear congruential generator; good enough for sample data.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

const CATALOG: [(&str, &str, &str); 8] = [
    ("flowers", "Flower Measurements", "Medidas de Flores"),
    ("cars", "Motor Trend Car Road Tests", "Pruebas de Carretera de Automóviles"),
    ("survey", "Student Survey Data", "Datos de Encuesta a Estudiantes"),
    ("airquality", "New York Air Quality Measurements", "Mediciones de Calidad del Aire de Nueva York"),
    ("Titanic", "Survival of passengers on the Titanic", "Supervivencia de pasajeros del Titanic"),
    ("women", "Average Heights and Weights for American Women", "Alturas y Pesos Promedio de Mujeres Estadounidenses"),
    ("quakes", "Locations of Earthquakes off Fiji", "Ubicaciones de Terremotos frente a Fiyi"),
    ("rivers", "Lengths of Major North American Rivers", "Longitudes de los Principales Ríos de América del Norte"),
];

fn flowers(rng: &mut Lcg) -> Result<RecordBatch> {
    let species = ["setosa", "versicolor", "virginica"];
    let base = [(1.5, 0.25), (4.3, 1.3), (5.5, 2.0)];

    let mut names = Vec::new();
    let mut lengths = Vec::new();
    let mut widths = Vec::new();
    let mut ids = Vec::new();
    for (i, (name, (length, width))) in species.iter().zip(base).enumerate() {
        for j in 0..50 {
            let id = (i * 50 + j) as i64 + 1;
            names.push(*name);
            // A few missing measurements.
            lengths.push((id % 37 != 0).then(|| length + rng.between(-0.4, 0.4)));
            widths.push(width + rng.between(-0.2, 0.2));
            ids.push(id);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("species", DataType::Utf8, false),
        Field::new("petal_length", DataType::Float64, true),
        Field::new("petal_width", DataType::Float64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(lengths)),
            Arc::new(Float64Array::from(widths)),
        ],
    )
    .context("building the flowers batch")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let library = args.out.join("datasets");
    fs::create_dir_all(&library).with_context(|| format!("creating {}", library.display()))?;
    let mut rng = Lcg(42);

    // ---- Parquet ----
    let batch = flowers(&mut rng)?;
    let file = fs::File::create(library.join("flowers.parquet"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    fs::write(
        library.join("flowers.txt"),
        "Flower Measurements\n\nPetal length and width for three species, 50 flowers each.\n",
    )?;

    // ---- CSV ----
    let mut cars = csv::Writer::from_path(library.join("cars.csv"))?;
    cars.write_record(["model", "mpg", "cyl", "automatic"])?;
    for (i, cyl) in [4, 6, 8].iter().cycle().take(32).enumerate() {
        let mpg = 40.0 - f64::from(*cyl) * 2.5 + rng.between(-3.0, 3.0);
        cars.write_record([
            format!("Model {}", i + 1),
            format!("{mpg:.1}"),
            cyl.to_string(),
            (i % 3 == 0).to_string(),
        ])?;
    }
    cars.flush()?;
    fs::write(
        library.join("cars.md"),
        "# Motor Trend Car Road Tests\n\nFuel consumption for 32 automobiles.\n",
    )?;

    // ---- JSON ----
    let answers = ["yes", "no", "maybe"];
    let records: Vec<_> = (0..40)
        .map(|i| {
            json!({
                "respondent": i + 1,
                "age": 18 + (i * 7) % 30,
                "answer": if i % 11 == 0 { serde_json::Value::Null } else { json!(answers[i % 3]) },
            })
        })
        .collect();
    fs::write(library.join("survey.json"), serde_json::to_vec_pretty(&records)?)?;

    // ---- Library index and catalog ----
    let mut index = csv::Writer::from_path(library.join("index.csv"))?;
    index.write_record(["Item", "Title"])?;
    for (id, title, _) in &CATALOG[..3] {
        index.write_record([id, title])?;
    }
    index.flush()?;

    let catalog_path = args.out.join("catalog.csv");
    let mut catalog = csv::Writer::from_path(&catalog_path)?;
    catalog.write_record(["dataset_id", "title", "title_es"])?;
    for (id, title, title_es) in &CATALOG {
        catalog.write_record([id, title, title_es])?;
    }
    catalog.flush()?;

    println!(
        "Wrote {} catalog entries to {} and a 3-dataset library to {}",
        CATALOG.len(),
        catalog_path.display(),
        library.display()
    );
    Ok(())
}
