//! The fixed acoustic route, modelled as an ordered table of control writes.

use serde::Deserialize;

use super::{ControlError, MixerGateway};

/// Value written to a mixer control.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    /// Switch or volume value, written to both channels.
    Integer(i32),
    /// Label of an enumerated item.
    Enumerated(String),
}

impl std::fmt::Display for ControlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Enumerated(item) => write!(f, "'{item}'"),
        }
    }
}

/// One intended mixer write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MixerControlWrite {
    /// Exact control name.
    pub name: String,
    /// Value to write.
    pub value: ControlValue,
}

impl MixerControlWrite {
    /// An integer write.
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value: ControlValue::Integer(value),
        }
    }

    /// An enumerated write.
    pub fn enumerated(name: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ControlValue::Enumerated(item.into()),
        }
    }
}

/// Ordered list of control writes that establishes one signal path.
///
/// Entries run top to bottom with no conditions and no rollback. A failed
/// entry is logged and recorded in the [`RouteReport`]; the remaining entries
/// still run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RouteProgram {
    writes: Vec<MixerControlWrite>,
}

impl RouteProgram {
    /// Creates a program from an explicit list of writes.
    pub fn new(writes: Vec<MixerControlWrite>) -> Self {
        Self { writes }
    }

    /// Speaker playback on the Speyside board.
    ///
    /// Both DSP mix paths feed the stereo DACs: DSP1 (high-passed) drives the
    /// main speakers from DAC1, DSP2 (low-passed) drives the sub speaker from
    /// DAC2.
    pub fn speyside() -> Self {
        use MixerControlWrite as W;

        Self::new(vec![
            W::enumerated("DSP1RX", "AIF1"),
            W::integer("DAC1L Mixer DSP1 Switch", 1),
            W::integer("DAC1R Mixer DSP1 Switch", 1),
            W::integer("DSP1 Playback Switch", 1),
            W::integer("DSP1 Playback Volume", 96),
            W::integer("DAC1 Switch", 1),
            W::integer("DAC1 Volume", 96),
            W::enumerated("DSP2RX", "AIF1"),
            W::integer("DAC2L Mixer DSP1 Switch", 0),
            W::integer("DAC2R Mixer DSP1 Switch", 0),
            W::integer("DAC2L Mixer DSP2 Switch", 1),
            W::integer("DAC2R Mixer DSP2 Switch", 1),
            W::integer("DSP2 Playback Switch", 1),
            W::integer("DSP2 Playback Volume", 96),
            W::integer("DAC2 Switch", 1),
            W::integer("DAC2 Volume", 96),
            W::integer("DAC2 Sidetone", 24),
            W::integer("Sub Speaker Switch", 1),
            W::integer("Sub Speaker Volume", 57),
            W::integer("Sub Speaker DC Volume", 3),
            W::integer("Sub Speaker AC Volume", 3),
            W::integer("Speaker Switch", 1),
            W::integer("Output 2 Volume", 15),
            W::enumerated("DSP1 EQ Mode", "Sub HPF"),
            W::enumerated("DSP2 EQ Mode", "Sub LPF"),
            W::integer("Sub IN1 Switch", 1),
            W::integer("Sub IN2 Switch", 1),
            W::enumerated("SPKL", "DAC1L"),
            W::enumerated("SPKR", "DAC1R"),
            W::integer("DSP1 EQ Switch", 1),
            W::integer("DSP2 EQ Switch", 1),
        ])
    }

    /// The writes in execution order.
    pub fn writes(&self) -> &[MixerControlWrite] {
        &self.writes
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns `true` if the program has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Runs every write against the mixer and reports each outcome.
    pub fn apply(&self, mixer: &mut MixerGateway) -> RouteReport {
        let outcomes = self
            .writes
            .iter()
            .map(|write| RouteOutcome {
                control: write.name.clone(),
                result: mixer.set(&write.name, &write.value),
            })
            .collect();

        let report = RouteReport { outcomes };
        tracing::debug!(
            applied = report.applied(),
            failed = report.failures().count(),
            "route program applied"
        );
        report
    }
}

impl Default for RouteProgram {
    fn default() -> Self {
        Self::speyside()
    }
}

/// Result of one route entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Control the entry targeted.
    pub control: String,
    /// Whether the write took effect.
    pub result: Result<(), ControlError>,
}

/// Per-entry outcomes of one [`RouteProgram::apply`] run, in program order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReport {
    outcomes: Vec<RouteOutcome>,
}

impl RouteReport {
    /// All outcomes in program order.
    pub fn outcomes(&self) -> &[RouteOutcome] {
        &self.outcomes
    }

    /// Number of entries that took effect.
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Entries that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ControlError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Returns `true` if every entry took effect.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}
