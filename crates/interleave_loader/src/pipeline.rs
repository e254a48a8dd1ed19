use {
    crate::{InstrumentError, PassError, Remapper},
    colorful::Colorful,
    interleave_core::{QualifiedName, UnitNode},
    std::{collections::HashSet, sync::Arc},
    tracing::{debug, warn},
};

/// Transforms the structural form of a unit. Passes are composed left to right, each receiving
/// the output of the previous one.
pub trait RewritePass: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn rewrite(&self, unit: UnitNode) -> Result<UnitNode, PassError>;
}

impl<F> RewritePass for F
where
    F: Fn(UnitNode) -> Result<UnitNode, PassError> + Send + Sync,
{
    fn rewrite(&self, unit: UnitNode) -> Result<UnitNode, PassError> {
        self(unit)
    }
}

/// The scheduling strategy's side of the pipeline.
pub trait Strategy {
    fn needs_transformation(&self) -> bool;

    fn create_transformer(&self) -> Arc<dyn RewritePass>;

    /// Used to express resolved ancestors in the shadow namespace.
    fn create_remapper(&self) -> Option<Arc<dyn Remapper>> {
        None
    }
}

/// The execution runner's side of the pipeline.
pub trait Runner {
    fn needs_transformation(&self) -> bool;

    fn create_transformer(&self) -> Arc<dyn RewritePass>;
}

/// An immutable, ordered list of rewrite passes.
///
/// When the `INTERLEAVE_DEBUG` environment variable is set at construction, every unit is printed
/// after each pass with the lines the pass introduced highlighted.
#[derive(Clone)]
pub struct Pipeline {
    dump: bool,
    passes: Vec<Arc<dyn RewritePass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new(Vec::new())
    }
}

impl Pipeline {
    pub fn new(passes: impl IntoIterator<Item = Arc<dyn RewritePass>>) -> Self {
        Pipeline {
            dump: std::env::var("INTERLEAVE_DEBUG").is_ok(),
            passes: passes.into_iter().collect(),
        }
    }

    pub fn single(pass: impl RewritePass + 'static) -> Self {
        Pipeline::new([Arc::new(pass) as Arc<dyn RewritePass>])
    }

    /// Overrides the `INTERLEAVE_DEBUG` setting.
    pub fn dump_changes(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }

    /// The strategy's pass runs first, then the runner's. Either is omitted when it needs no
    /// transformation.
    pub fn for_collaborators(strategy: &dyn Strategy, runner: &dyn Runner) -> Self {
        let mut passes = Vec::with_capacity(2);
        if strategy.needs_transformation() {
            passes.push(strategy.create_transformer());
        }
        if runner.needs_transformation() {
            passes.push(runner.create_transformer());
        }
        Pipeline::new(passes)
    }

    pub fn passes(&self) -> &[Arc<dyn RewritePass>] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Applies every pass in order. The output keeps the format version of the input.
    pub fn run(&self, name: &QualifiedName, unit: UnitNode) -> Result<UnitNode, InstrumentError> {
        let version = unit.version;
        let mut unit = unit;
        for pass in &self.passes {
            let before = self.dump.then(|| unit.clone());
            unit = pass
                .rewrite(unit)
                .map_err(|source| InstrumentError::Pass {
                    pass: pass.name().to_string(),
                    source,
                })?;
            debug!(unit = %name, pass = pass.name(), "Applied rewrite pass.");
            if let Some(before) = before {
                print!("{}", render_changes(name, pass.name(), &before, &unit));
            }
        }
        if unit.version != version {
            warn!(
                unit = %name,
                expected = %version,
                found = %unit.version,
                "Rewrite pipeline changed the format version. Restoring."
            );
            unit.version = version;
        }
        Ok(unit)
    }
}

/// Renders the unit after a pass, highlighting the lines the pass introduced.
fn render_changes(name: &QualifiedName, pass: &str, before: &UnitNode, after: &UnitNode) -> String {
    let before = format!("{before:#?}");
    let before: HashSet<&str> = before.lines().collect();
    let mut out = format!("=== {name} after {pass} ===\n");
    for line in format!("{after:#?}").lines() {
        if before.contains(line) {
            out.push_str(line);
        } else {
            out.push_str(&line.color(colorful::Color::Green).to_string());
        }
        out.push('\n');
    }
    out
}
