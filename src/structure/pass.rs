// Fri Jan 16 2026 - Alex

use crate::structure::{
    DeclIndex, FlattenOptions, FlattenedStruct, LayoutEngine, LayoutError, LayoutResult, LayoutValidator,
    Rewriter,
};
use crate::syntax::{preprocess, Unit};
use std::iter;
use std::rc::Rc;

#[derive(Debug)]
pub struct PassOutput {
    /// The primary unit with every flatten-marked struct replaced.
    pub unit: Unit,
    /// Every layout computed during the run, dependencies first.
    pub layouts: Vec<Rc<FlattenedStruct>>,
    /// The structs that were replaced in `unit`.
    pub rewritten: Vec<Rc<FlattenedStruct>>,
}

/// One invocation of the tool: a primary unit to rewrite plus auxiliary
/// units that only contribute referenced declarations.
pub struct FlattenPass {
    options: FlattenOptions,
    defines: Vec<String>,
}

impl FlattenPass {
    pub fn new(options: FlattenOptions) -> Self {
        Self {
            options,
            defines: Vec::new(),
        }
    }

    pub fn with_defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    pub fn options(&self) -> FlattenOptions {
        self.options
    }

    pub fn run(&self, primary: &Unit, auxiliary: &[Unit]) -> LayoutResult<PassOutput> {
        let primary = preprocess(primary, &self.defines);
        let auxiliary = self.preprocess_all(auxiliary);
        let index = DeclIndex::from_units(iter::once(&primary).chain(auxiliary.iter()));
        log::info!(
            "Indexed {} struct declarations from {} units",
            index.len(),
            auxiliary.len() + 1
        );

        let mut engine = LayoutEngine::new(&index, self.options);
        let mut rewriter = Rewriter::new(&mut engine);
        let unit = rewriter.rewrite_unit(&primary)?;
        let rewritten = rewriter.into_rewritten();

        let layouts: Vec<_> = engine.cache().iter().cloned().collect();
        log::info!(
            "Flattened {} structs ({} layouts computed, {} cache hits)",
            rewritten.len(),
            engine.computed(),
            engine.cache().hits()
        );

        Ok(PassOutput {
            unit,
            layouts,
            rewritten,
        })
    }

    /// Validates every rewritten struct and re-flattens its output form,
    /// which must reproduce the same layout.
    pub fn verify(&self, output: &PassOutput, auxiliary: &[Unit]) -> LayoutResult<()> {
        let validator = LayoutValidator::new();
        for flat in &output.rewritten {
            validator.validate(flat)?;
        }

        let auxiliary = self.preprocess_all(auxiliary);
        let index = DeclIndex::from_units(iter::once(&output.unit).chain(auxiliary.iter()));
        let mut engine = LayoutEngine::new(&index, self.options);
        for flat in &output.rewritten {
            let again = engine.flatten(&flat.key)?;
            if again.layout != flat.layout {
                return Err(LayoutError::ValidationFailed(format!(
                    "{} drifts on re-flatten: size {} / alignment {} became size {} / alignment {}",
                    flat.key,
                    flat.layout.size,
                    flat.layout.largest_member_alignment,
                    again.layout.size,
                    again.layout.largest_member_alignment
                )));
            }
        }
        log::debug!("Verified {} rewritten structs", output.rewritten.len());
        Ok(())
    }

    fn preprocess_all(&self, units: &[Unit]) -> Vec<Unit> {
        units.iter().map(|unit| preprocess(unit, &self.defines)).collect()
    }
}
