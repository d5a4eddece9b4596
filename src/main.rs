//! # Labelsmith CLI
//!
//! Command-line access to the label composition engine.
//!
//! ## Usage
//!
//! ```bash
//! # Script and direction of a string
//! labelsmith classify "مرحبا"
//!
//! # Largest font size for a box, and the box for a font size
//! labelsmith fit "Chicken Breast 500g" --width 200 --height 40
//! labelsmith autosize "Chicken Breast 500g" --size 18
//!
//! # Build a label from a batch record
//! labelsmith bind record.json --field itemKey --field batchNo --barcode batchNo
//!
//! # Fetch a batch from the backend and bind it
//! labelsmith fetch B-1042 --url http://labels.local/api --field itemKey
//!
//! # Rescale a template to another paper
//! labelsmith resize template.json --paper 4x4
//!
//! # Render a barcode or QR code to PNG
//! labelsmith code 4006381333931 --format ean13 --png ean.png
//! labelsmith code https://trace.example/L-42 --qr --png qr.png
//!
//! # Rasterize every code in a template
//! labelsmith codes template.json --out codes/
//! ```
//!
//! Set `RUST_LOG=labelsmith=debug` for engine logs on stderr.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use labelsmith::{
    EditorSession, EngineConfig, Element, LabelError, Template,
    batch::{FieldSelection, FlatRecord, flatten_record},
    canvas::{Orientation, PaperSize, units_to_mm},
    client::HttpBackend,
    codes,
    element::{BarcodeFormat, ElementKind, QrErrorLevel},
    script,
    text_fit::{Size, TextFit},
};

/// Labelsmith - Label composition engine
#[derive(Parser, Debug)]
#[command(name = "labelsmith")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the script and direction of a string
    Classify { text: String },

    /// Largest font size at which text fits a box
    Fit {
        text: String,

        #[arg(long)]
        width: f64,

        #[arg(long)]
        height: f64,

        #[arg(long, default_value = "Arial")]
        family: String,
    },

    /// Box that holds text at a font size
    Autosize {
        text: String,

        #[arg(long)]
        size: f64,

        #[arg(long, default_value = "Arial")]
        family: String,
    },

    /// Build a label from a batch record (JSON object)
    Bind {
        record: PathBuf,

        #[command(flatten)]
        fields: FieldArgs,

        #[command(flatten)]
        paper: PaperArgs,
    },

    /// Fetch a batch from the backend and build its label
    Fetch {
        batch_no: String,

        /// Backend base URL
        #[arg(long)]
        url: String,

        #[command(flatten)]
        fields: FieldArgs,

        #[command(flatten)]
        paper: PaperArgs,
    },

    /// Rescale a template onto another paper size
    Resize {
        template: PathBuf,

        #[command(flatten)]
        paper: PaperArgs,
    },

    /// Render a barcode or QR code
    Code {
        value: String,

        /// Render a QR code instead of a barcode
        #[arg(long)]
        qr: bool,

        /// Barcode format (code128, code39, code93, ean13, ean8, upca, itf)
        #[arg(long, default_value = "code128")]
        format: String,

        /// QR error correction level (L, M, Q, H)
        #[arg(long, default_value = "M")]
        level: String,

        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Rasterize every barcode and QR code of a template to PNG files
    Codes {
        template: PathBuf,

        /// Output directory (one `<element id>.png` per code)
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },

    /// List paper sizes
    Papers,
}

#[derive(clap::Args, Debug)]
struct FieldArgs {
    /// Field to print as text (repeatable, printed in order)
    #[arg(long = "field", value_name = "NAME")]
    fields: Vec<String>,

    /// Field to print as a barcode in the bottom band
    #[arg(long, value_name = "NAME")]
    barcode: Option<String>,

    /// Barcode format for --barcode
    #[arg(long = "barcode-format", default_value = "code128")]
    barcode_format: String,
}

#[derive(clap::Args, Debug)]
struct PaperArgs {
    #[arg(long, default_value = "4x6")]
    paper: String,

    #[arg(long, default_value = "portrait")]
    orientation: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Classify { text } => {
            let script = script::classify(&text);
            println!("script:    {}", script.name());
            println!("direction: {:?}", script::dominant_direction(&text));
        }

        Commands::Fit {
            text,
            width,
            height,
            family,
        } => {
            let fit = TextFit::new(config.text);
            println!("{}", fit.fit(&text, &family, Size::new(width, height)));
        }

        Commands::Autosize { text, size, family } => {
            let fit = TextFit::new(config.text);
            let b = fit.autosize(&text, size, &family);
            println!("{} x {}", b.width, b.height);
        }

        Commands::Bind {
            record,
            fields,
            paper,
        } => {
            let content = std::fs::read_to_string(&record)?;
            let value: serde_json::Value = serde_json::from_str(&content)?;
            let record: FlatRecord = flatten_record(&value);
            let mut session = session_on(config, &paper)?;
            session.apply_batch(&record, &fields.selection()?);
            println!("{}", session.to_template().to_json()?);
        }

        Commands::Fetch {
            batch_no,
            url,
            fields,
            paper,
        } => {
            let backend = HttpBackend::new(url)?;
            let selection = fields.selection()?;
            let mut session = session_on(config, &paper)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(session.load_batch(&backend, &batch_no, &selection))?;
            eprintln!("row {} ({:?})", outcome.row_index, outcome.row_match);
            println!("{}", session.to_template().to_json()?);
        }

        Commands::Resize { template, paper } => {
            let template = read_template(&template)?;
            let (paper_size, orientation) = paper.parse()?;
            let mut session = EditorSession::new(config);
            session.load_template(template);
            session.set_paper(paper_size, orientation);
            println!("{}", session.to_template().to_json()?);
        }

        Commands::Code {
            value,
            qr,
            format,
            level,
            png,
        } => {
            let element = if qr {
                let mut el = Element::qr(value);
                if let ElementKind::Qr(props) = &mut el.kind {
                    props.error_level = parse_level(&level)?;
                }
                el
            } else {
                Element::barcode(value, parse_format(&format)?)
            };
            let bytes = match codes::rasterize_element(&element, &config.codes) {
                Some(Ok(rendered)) => rendered.to_png()?,
                Some(Err(placeholder)) => {
                    eprintln!("warning: {}", placeholder.reason);
                    placeholder.to_png()?
                }
                None => return Err(LabelError::InvalidOperation("not a symbolic code".into())),
            };
            std::fs::write(&png, bytes)?;
            println!("Saved to {}", png.display());
        }

        Commands::Codes { template, out } => {
            let template = read_template(&template)?;
            std::fs::create_dir_all(&out)?;
            let mut elements = Vec::new();
            for el in &template.elements {
                el.walk(&mut |e| {
                    if e.is_symbolic_code() {
                        elements.push(e);
                    }
                });
            }
            for el in elements {
                let (bytes, status) = match codes::rasterize_element(el, &config.codes) {
                    Some(Ok(rendered)) => (rendered.to_png()?, "ok"),
                    Some(Err(placeholder)) => (placeholder.to_png()?, "placeholder"),
                    None => continue,
                };
                let path = out.join(format!("{}.png", el.id));
                std::fs::write(&path, bytes)?;
                println!("{:<40} {:<12} {}", el.id, status, path.display());
            }
        }

        Commands::Papers => {
            println!(
                "{:<12} {:>10} {:>10} {:>16}",
                "paper", "width", "height", "mm"
            );
            for paper in PaperSize::ALL {
                let c = paper.canvas_size(Orientation::Portrait);
                let mm = format!("{:.0} x {:.0}", units_to_mm(c.width), units_to_mm(c.height));
                println!("{:<12} {:>10} {:>10} {:>16}", paper.name(), c.width, c.height, mm);
            }
        }
    }

    Ok(())
}

impl FieldArgs {
    fn selection(&self) -> Result<Vec<FieldSelection>, LabelError> {
        let mut selection: Vec<FieldSelection> =
            self.fields.iter().map(|f| FieldSelection::text(f.as_str())).collect();
        if let Some(field) = &self.barcode {
            selection.push(FieldSelection::barcode(field.as_str(), parse_format(&self.barcode_format)?));
        }
        if selection.is_empty() {
            return Err(LabelError::InvalidOperation(
                "select at least one --field or --barcode".into(),
            ));
        }
        Ok(selection)
    }
}

impl PaperArgs {
    fn parse(&self) -> Result<(PaperSize, Orientation), LabelError> {
        let paper = PaperSize::parse(&self.paper)
            .ok_or_else(|| LabelError::Config(format!("unknown paper size '{}'", self.paper)))?;
        let orientation = Orientation::parse(&self.orientation).ok_or_else(|| {
            LabelError::Config(format!("unknown orientation '{}'", self.orientation))
        })?;
        Ok((paper, orientation))
    }
}

fn session_on(config: EngineConfig, paper: &PaperArgs) -> Result<EditorSession, LabelError> {
    let (paper_size, orientation) = paper.parse()?;
    let mut session = EditorSession::new(config);
    session.load_template(Template::new("Batch label", paper_size, orientation));
    Ok(session)
}

fn read_template(path: &Path) -> Result<Template, LabelError> {
    let content = std::fs::read_to_string(path)?;
    Template::from_json(&content)
}

fn parse_format(name: &str) -> Result<BarcodeFormat, LabelError> {
    BarcodeFormat::parse(name).ok_or_else(|| {
        let known: Vec<&str> = BarcodeFormat::ALL.iter().map(|f| f.name()).collect();
        LabelError::Config(format!("unknown barcode format '{}' (one of {})", name, known.join(", ")))
    })
}

fn parse_level(name: &str) -> Result<QrErrorLevel, LabelError> {
    match name.to_ascii_uppercase().as_str() {
        "L" => Ok(QrErrorLevel::L),
        "M" => Ok(QrErrorLevel::M),
        "Q" => Ok(QrErrorLevel::Q),
        "H" => Ok(QrErrorLevel::H),
        _ => Err(LabelError::Config(format!("unknown QR error level '{}'", name))),
    }
}
