// Fri Jan 16 2026 - Alex

use super::args::{Args, Command, FlattenArgs, InspectArgs, SourceArgs};
use crate::config::{Config, OutputFormat};
use crate::structure::{
    DeclIndex, FlattenPass, FlattenedStruct, LayoutEngine, LayoutValidator, SerializableLayout,
};
use crate::syntax::{preprocess, DeclPrinter, Unit};
use crate::ui::{print_info, print_success, print_warning, LayoutTable};
use anyhow::Context;
use colored::Colorize;
use std::fs;
use std::rc::Rc;

pub struct CommandHandler {
    use_color: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self { use_color: true }
    }

    pub fn execute(mut self, args: Args) -> anyhow::Result<()> {
        self.setup_logging(&args)?;
        if args.no_color {
            colored::control::set_override(false);
            self.use_color = false;
        }

        match args.command {
            Command::Flatten(flatten_args) => self.handle_flatten(flatten_args),
            Command::Inspect(inspect_args) => self.handle_inspect(inspect_args),
        }
    }

    fn setup_logging(&self, args: &Args) -> anyhow::Result<()> {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            other => return Err(anyhow::anyhow!("Unknown log level: {}", other)),
        };

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .init();

        Ok(())
    }

    fn load_config(&self, source: &SourceArgs) -> anyhow::Result<Config> {
        let mut config = match &source.config {
            Some(path) => Config::load(path).with_context(|| format!("Failed to load config {:?}", path))?,
            None => Config::new(),
        };

        if let Some(target) = source.target {
            config.target = target;
        }
        if source.no_inline {
            config.inline_nested_structs = false;
        }
        if source.no_padding {
            config.pad_trailing = false;
        }
        config.defines.extend(source.defines.iter().cloned());
        config.validate()?;

        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    fn load_units(&self, source: &SourceArgs) -> anyhow::Result<(Unit, Vec<Unit>)> {
        source.validate().map_err(|e| anyhow::anyhow!(e))?;

        let primary = Unit::load(&source.input).with_context(|| format!("Failed to load {:?}", source.input))?;
        let aux = source
            .aux
            .iter()
            .map(|path| Unit::load(path).with_context(|| format!("Failed to load {:?}", path)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        print_info(&format!(
            "Loaded {} ({} auxiliary units)",
            primary.name,
            aux.len()
        ));
        Ok((primary, aux))
    }

    fn handle_flatten(&self, args: FlattenArgs) -> anyhow::Result<()> {
        let mut config = self.load_config(&args.source)?;
        if let Some(format) = args.format {
            config.output_format = format;
        }
        let (primary, aux) = self.load_units(&args.source)?;

        let pass = FlattenPass::new(config.flatten_options()).with_defines(config.active_defines());
        let output = pass.run(&primary, &aux)?;
        if output.rewritten.is_empty() {
            print_warning("No struct is marked for flattening");
        }

        if args.verify {
            pass.verify(&output, &aux)?;
            print_success(&format!("Verified {} structs", output.rewritten.len()));
        }

        let text = match config.output_format {
            OutputFormat::Source => DeclPrinter::new().print_unit(&output.unit),
            OutputFormat::Json => output.unit.to_json(config.pretty_json)?,
        };
        match &args.output {
            Some(path) => {
                fs::write(path, &text).with_context(|| format!("Failed to write {:?}", path))?;
                print_success(&format!("Output written to: {:?}", path));
            }
            None => println!("{}", text),
        }

        if let Some(path) = &args.report {
            let layouts: Vec<SerializableLayout> = output.layouts.iter().map(|f| SerializableLayout::from(&**f)).collect();
            crate::structure::serializer::write_report(path, &layouts, config.pretty_json)?;
            print_success(&format!("Layout report written to: {:?}", path));
        }

        print_success(&format!(
            "Flattened {} structs for {}",
            output.rewritten.len(),
            config.target
        ));
        Ok(())
    }

    fn handle_inspect(&self, args: InspectArgs) -> anyhow::Result<()> {
        let config = self.load_config(&args.source)?;
        let (primary, aux) = self.load_units(&args.source)?;

        let layouts = match &args.type_name {
            Some(name) => vec![self.flatten_named(&config, &primary, &aux, name)?],
            None => {
                let pass = FlattenPass::new(config.flatten_options()).with_defines(config.active_defines());
                pass.run(&primary, &aux)?.layouts
            }
        };

        let validator = LayoutValidator::new();
        for flat in &layouts {
            println!(
                "{} {} {}",
                flat.key.to_string().cyan().bold(),
                format!("size 0x{:x} ({})", flat.layout.size, flat.layout.size).green(),
                format!("align {}", flat.layout.largest_member_alignment).dimmed()
            );
            println!(
                "{}",
                LayoutTable::new(flat, args.accessors).with_color(self.use_color).build()
            );

            let overlaps = validator.find_overlaps(flat);
            if !overlaps.is_empty() {
                println!("  {} overlapping field pairs", overlaps.len().to_string().yellow());
            }
            println!();
        }
        Ok(())
    }

    fn flatten_named(
        &self,
        config: &Config,
        primary: &Unit,
        aux: &[Unit],
        name: &str,
    ) -> anyhow::Result<Rc<FlattenedStruct>> {
        let defines = config.active_defines();
        let units: Vec<Unit> = std::iter::once(primary)
            .chain(aux.iter())
            .map(|unit| preprocess(unit, &defines))
            .collect();
        let index = DeclIndex::from_units(&units);

        let key = index
            .structs()
            .map(|(key, _)| key)
            .find(|key| key.as_str() == name || key.simple_name() == name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No struct named {}", name))?;

        let mut engine = LayoutEngine::new(&index, config.flatten_options());
        let flat = engine.flatten(&key)?;
        Ok(flat)
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
