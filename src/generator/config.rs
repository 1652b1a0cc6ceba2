//! Generator configuration and swarm sampling.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::GenerateError;
use crate::lang::Language;

/// The construct kinds the generator can expand an open block into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// Insert a single fresh block.
    Basic,
    /// Two-way selection with a merge.
    Selection,
    /// Multi-way switch with a default arm and a merge.
    Switch,
    /// Loop with a merge-first edge pair.
    Loop,
}

/// Feature flags and knobs steering CFG generation.
///
/// Every flag gates one construct or decoration; "swarm mode" samples the
/// flags uniformly per graph, forcing at least one construct on so that
/// expansion always makes progress.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Allow basic-block insertion.
    pub allow_basic: bool,
    /// Allow loop constructs.
    pub allow_loop: bool,
    /// Allow two-way selections.
    pub allow_selection: bool,
    /// Allow switches (every switch carries a default arm).
    pub allow_switch_default: bool,
    /// Allow switch cases to fall through into the next case.
    pub allow_switch_fallthrough: bool,
    /// Allow the decoration pass to insert break blocks.
    pub allow_break: bool,
    /// Allow the decoration pass to insert continue blocks.
    pub allow_continue: bool,
    /// Minimum switch out-degree (cases plus default).
    pub min_successors: usize,
    /// Maximum switch out-degree (cases plus default).
    pub max_successors: usize,
    /// Probability that an eligible construct reuses the enclosing merge.
    pub merge_share_probability: f64,
    /// Probability that an eligible block is rewritten to break/continue.
    pub break_continue_probability: f64,
}

impl GeneratorConfig {
    /// Every feature the target language permits.
    #[must_use]
    pub fn allow_all(language: Language) -> Self {
        GeneratorConfig {
            allow_basic: true,
            allow_loop: true,
            allow_selection: true,
            allow_switch_default: true,
            allow_switch_fallthrough: language.allows_switch_fallthrough(),
            allow_break: true,
            allow_continue: true,
            min_successors: 3,
            max_successors: 5,
            merge_share_probability: 0.5,
            break_continue_probability: 0.4,
        }
    }

    /// Swarm mode: sample every flag uniformly, then force at least one
    /// construct flag on so expansion can always make progress, and constrain
    /// fallthrough to what the target permits.
    #[must_use]
    pub fn swarm(rng: &mut StdRng, language: Language) -> Self {
        let mut config = GeneratorConfig {
            allow_basic: rng.gen(),
            allow_loop: rng.gen(),
            allow_selection: rng.gen(),
            allow_switch_default: rng.gen(),
            allow_switch_fallthrough: rng.gen(),
            allow_break: rng.gen(),
            allow_continue: rng.gen(),
            ..GeneratorConfig::allow_all(language)
        };
        config.allow_switch_fallthrough &= language.allows_switch_fallthrough();
        if config.enabled_constructs().is_empty() {
            let forced = [
                Construct::Basic,
                Construct::Selection,
                Construct::Switch,
                Construct::Loop,
            ][rng.gen_range(0..4)];
            match forced {
                Construct::Basic => config.allow_basic = true,
                Construct::Selection => config.allow_selection = true,
                Construct::Switch => config.allow_switch_default = true,
                Construct::Loop => config.allow_loop = true,
            }
        }
        config
    }

    /// The constructs this configuration enables.
    #[must_use]
    pub fn enabled_constructs(&self) -> Vec<Construct> {
        let mut constructs = Vec::new();
        if self.allow_selection {
            constructs.push(Construct::Selection);
        }
        if self.allow_loop {
            constructs.push(Construct::Loop);
        }
        if self.allow_switch_default {
            constructs.push(Construct::Switch);
        }
        if self.allow_basic {
            constructs.push(Construct::Basic);
        }
        constructs
    }

    /// Pick one enabled construct uniformly.
    ///
    /// # Errors
    ///
    /// Fails with [`GenerateError::NoConstructEnabled`] when every construct
    /// flag is off.
    pub fn choose_construct(&self, rng: &mut StdRng) -> Result<Construct, GenerateError> {
        let constructs = self.enabled_constructs();
        if constructs.is_empty() {
            return Err(GenerateError::NoConstructEnabled);
        }
        Ok(constructs[rng.gen_range(0..constructs.len())])
    }
}
