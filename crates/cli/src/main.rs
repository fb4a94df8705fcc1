use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stubgen_cli::flags::{NamespaceArg, TimeFlag};
use stubgen_cli::gofmt::Gofmt;
use stubgen_cli::{report, run, Invocation};
use stubgen_engine::{EmbedPolicy, Formatter, GeneratorConfig};

#[derive(Parser)]
#[command(name = "stubgen")]
#[command(
    about = "Generate Go implementation stubs and struct transforms from go:generate directives",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Destination file, relative to the source file's directory
    #[arg(short, long)]
    destination: PathBuf,

    /// Package name of the destination file
    #[arg(short, long)]
    package: String,

    /// Name of the generated type (default: derived from the declaration)
    #[arg(short, long)]
    name: Option<String>,

    /// Overwrite declarations that already exist in the destination
    #[arg(long)]
    replace: bool,

    /// Do not flatten embedded interfaces
    #[arg(long)]
    no_embed: bool,

    /// Fail on embedded interfaces that cannot be resolved
    #[arg(long, conflicts_with = "no_embed")]
    strict_embed: bool,

    /// Emit a New<Type> constructor
    #[arg(long)]
    constructor: bool,

    /// Source file holding the directive
    #[arg(long, env = "GOFILE")]
    source: PathBuf,

    /// Line of the directive in the source file
    #[arg(long, env = "GOLINE", required_unless_present = "type_name")]
    line: Option<usize>,

    /// Look the declaration up by name instead of by directive line
    #[arg(long = "type", value_name = "NAME")]
    type_name: Option<String>,

    /// Package of the source file as reported by go generate
    #[arg(long, env = "GOPACKAGE")]
    source_package: Option<String>,

    /// Generate To<Ns>() for a package, optionally with its import path (ns=path)
    #[arg(long, value_parser = NamespaceArg::parse)]
    to: Vec<NamespaceArg>,

    /// Generate New<Type>From<Ns>() for a package (ns or ns=path)
    #[arg(long, value_parser = NamespaceArg::parse)]
    from: Vec<NamespaceArg>,

    /// Keep struct tags when copying a struct
    #[arg(long)]
    tagged: bool,

    /// Retype *Time fields when copying a struct
    #[arg(long, value_enum, default_value_t = TimeFlag::Keep)]
    time: TimeFlag,

    /// Fail when flattened struct fields collide
    #[arg(long)]
    strict_fields: bool,

    /// Omit the generation marker comment
    #[arg(long)]
    no_comment: bool,

    /// Skip gofmt
    #[arg(long)]
    no_format: bool,

    /// Compute the result without writing the destination
    #[arg(long)]
    dry_run: bool,

    /// Print the merge report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            namespace: self.package.clone(),
            type_name: self.name.clone(),
            replace: self.replace,
            follow_embeds: !self.no_embed,
            embed_policy: if self.strict_embed {
                EmbedPolicy::Strict
            } else {
                EmbedPolicy::Lenient
            },
            constructor: self.constructor,
            keep_tags: self.tagged,
            time_conversion: self.time.as_domain(),
            strict_fields: self.strict_fields,
            to: self.to.iter().map(|arg| arg.namespace.clone()).collect(),
            from: self.from.iter().map(|arg| arg.namespace.clone()).collect(),
            emit_comments: !self.no_comment,
            ..GeneratorConfig::default()
        }
    }

    fn invocation(&self) -> Invocation {
        let imports = self
            .to
            .iter()
            .chain(&self.from)
            .filter_map(|arg| Some((arg.namespace.clone(), arg.import.clone()?)))
            .collect();

        Invocation {
            source: self.source.clone(),
            line: self.line,
            lookup: self.type_name.clone(),
            source_package: self.source_package.clone(),
            destination: self.destination.clone(),
            config: self.config(),
            imports,
            dry_run: self.dry_run,
        }
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout is reserved for JSON
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let gofmt = Gofmt::default();
    let formatter: Option<&dyn Formatter> = if cli.no_format { None } else { Some(&gofmt) };

    let invocation = cli.invocation();
    let outcome = run(&invocation, formatter).with_context(|| {
        format!(
            "stubgen {} -> {}",
            invocation.source.display(),
            invocation.destination.display()
        )
    })?;

    if cli.json {
        println!("{}", report::render_json(&outcome)?);
    } else if cli.dry_run {
        print!("{}", outcome.rendered);
        log::info!("{}", report::summary_line(&outcome, true));
    } else {
        log::info!("{}", report::summary_line(&outcome, false));
    }

    Ok(())
}
