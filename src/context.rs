use rand::rngs::StdRng;
use rand::SeedableRng;

/// Explicit execution state shared by the builder, trainer and exporter.
///
/// Everything that would otherwise be a process-wide setting lives here: the random
/// source used for weight initialization, dataset generation and shuffling, and whether
/// training reports progress on the terminal. Passing the same seed reproduces a run.
///
/// # Fields
///
/// - `rng` - Seedable random generator threaded through every stage
/// - `seed` - The seed the generator was created from, if any
/// - `verbose` - Shows an `indicatif` progress bar during training when `true`
pub struct ExecutionContext {
    rng: StdRng,
    seed: Option<u64>,
    verbose: bool,
}

impl ExecutionContext {
    /// Creates a context seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            seed: None,
            verbose: false,
        }
    }

    /// Creates a deterministic context.
    ///
    /// # Parameters
    ///
    /// * `seed` - Seed for the internal `StdRng`
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
            verbose: false,
        }
    }

    /// Enables or disables the training progress bar.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Mutable access to the random generator.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
