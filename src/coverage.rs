//! Coverage expansion for a single cell.
//!
//! A search never returns more than `cap` records, so a page of `cap` records
//! says nothing about how many really match. The expander narrows such a
//! query with free-text terms of growing width until every sub-query of one
//! width comes back under the cap.
//!
//! Decisions are made by [`Plan::step`], a pure transition over
//! [`Phase`]s driven by page sizes. [`expand`] only issues queries and feeds
//! their sizes back in.

use chrono::Local;
use serde::Serialize;

use crate::{
    dedup::Deduplicator, filter::QueryFilter, info_time, record::Record,
    request::SearchExecutor, terms::TermSpace, warn_time, Error, Result,
};

/// How far a cell's result can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completeness {
    /// The root query came back under the cap.
    Exact,
    /// Every term of `width` came back under the cap.
    Covered { width: usize },
    /// Last width scanned in full although `overflowing` terms hit the cap.
    BestEffort { width: usize, overflowing: usize },
}

impl Completeness {
    pub fn is_guaranteed(&self) -> bool {
        !matches!(self, Completeness::BestEffort { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Root query is capped but partitioning is turned off.
    BruteForceDisabled { count: usize },
    /// Every width up to the max was aborted.
    CapacityExhausted,
    /// A width finished without a single term to scan.
    NoTerms { width: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Root,
    /// `scanned` counts the terms answered on `width` so far, `overflowing`
    /// the capped ones on a width that tolerates them.
    Scanning {
        width: usize,
        scanned: usize,
        overflowing: usize,
    },
    Covered(Completeness),
    Unresolvable(Failure),
}

impl Phase {
    fn start(width: usize) -> Self {
        Phase::Scanning {
            width,
            scanned: 0,
            overflowing: 0,
        }
    }

    pub fn width(&self) -> Option<usize> {
        match self {
            Phase::Scanning { width, .. } => Some(*width),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A query of the current phase returned `count` records.
    Page { count: usize },
    /// The current width ran out of terms.
    WidthDone,
}

/// Per-cell expansion parameters.
#[derive(Debug, Clone)]
pub struct Plan {
    pub cap: usize,
    pub alphabet: Vec<char>,
    pub min_width: usize,
    /// 0 disables partitioning.
    pub max_width: usize,
    /// Only relaxes the last width.
    pub allow_partial: bool,
}

impl Plan {
    /// A plan that never partitions. Used for cells known to be small.
    pub fn trusted(cap: usize) -> Self {
        Self {
            cap,
            alphabet: Vec::new(),
            min_width: 0,
            max_width: 0,
            allow_partial: false,
        }
    }

    pub fn brute_force_enabled(&self) -> bool {
        self.min_width > 0 && self.max_width > 0
    }

    /// Rejects plans whose width range can't be scanned in full.
    pub fn validate(&self) -> Result<()> {
        if self.cap == 0 {
            return Err(Error::Config("cap must be at least 1".into()));
        }
        if !self.brute_force_enabled() {
            return Ok(());
        }
        if self.alphabet.is_empty() {
            return Err(Error::Config("alphabet is empty".into()));
        }
        if self.min_width > self.max_width {
            return Err(Error::Config(format!(
                "min width {} is larger than max width {}",
                self.min_width, self.max_width
            )));
        }
        if self.max_width > self.alphabet.len() {
            return Err(Error::Config(format!(
                "max width {} exceeds the alphabet size {}",
                self.max_width,
                self.alphabet.len()
            )));
        }
        Ok(())
    }

    /// Whether capped terms on `width` are tolerated instead of aborting it.
    fn tolerates_overflow(&self, width: usize) -> bool {
        self.allow_partial && width == self.max_width
    }

    fn after_abort(&self, width: usize) -> Phase {
        if width < self.max_width {
            Phase::start(width + 1)
        } else {
            Phase::Unresolvable(Failure::CapacityExhausted)
        }
    }

    pub fn step(&self, phase: Phase, event: Event) -> Phase {
        match (phase, event) {
            (Phase::Root, Event::Page { count }) if count < self.cap => {
                Phase::Covered(Completeness::Exact)
            }
            (Phase::Root, Event::Page { count }) if !self.brute_force_enabled() => {
                Phase::Unresolvable(Failure::BruteForceDisabled { count })
            }
            (Phase::Root, Event::Page { .. }) => Phase::start(self.min_width),
            (
                Phase::Scanning {
                    width,
                    scanned,
                    overflowing,
                },
                Event::Page { count },
            ) if count < self.cap => Phase::Scanning {
                width,
                scanned: scanned + 1,
                overflowing,
            },
            (
                Phase::Scanning {
                    width,
                    scanned,
                    overflowing,
                },
                Event::Page { .. },
            ) if self.tolerates_overflow(width) => Phase::Scanning {
                width,
                scanned: scanned + 1,
                overflowing: overflowing + 1,
            },
            (Phase::Scanning { width, .. }, Event::Page { .. }) => self.after_abort(width),
            (Phase::Scanning { width, scanned: 0, .. }, Event::WidthDone) => {
                Phase::Unresolvable(Failure::NoTerms { width })
            }
            (Phase::Scanning { width, overflowing: 0, .. }, Event::WidthDone) => {
                Phase::Covered(Completeness::Covered { width })
            }
            (Phase::Scanning { width, overflowing, .. }, Event::WidthDone) => {
                Phase::Covered(Completeness::BestEffort { width, overflowing })
            }
            // Terminal phases absorb everything; the root has no width to finish.
            (phase, _) => phase,
        }
    }
}

/// Deduplicated records of one cell and how far they can be trusted.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub records: Vec<Record>,
    pub completeness: Completeness,
    pub queries: usize,
}

/// Resolves one cell. `base` must be a root filter (no free-text term).
pub async fn expand<E: SearchExecutor>(
    executor: &E,
    base: &QueryFilter,
    plan: &Plan,
) -> Result<Expansion> {
    plan.validate()?;
    if !base.is_root() {
        return Err(Error::Config(format!("{base} already has a free-text term")));
    }
    let start_time = Local::now();
    let mut found = Deduplicator::new();

    let page = executor.search(base).await?;
    let mut queries = 1;
    let mut phase = plan.step(Phase::Root, Event::Page { count: page.len() });
    found.extend(page);

    while let Some(width) = phase.width() {
        let space = TermSpace::new(&plan.alphabet, width);
        info_time!("{base}: scanning width {width}, {} terms", space.term_count());
        let mut terms = space.iter();
        loop {
            let Some(term) = terms.next() else {
                phase = plan.step(phase, Event::WidthDone);
                break;
            };
            let page = executor.search(&base.with_text(term.as_str())).await?;
            queries += 1;
            phase = plan.step(phase, Event::Page { count: page.len() });
            found.extend(page);
            if phase.width() != Some(width) {
                info_time!("{base}: term {term:?} hit the cap, width {width} is too coarse");
                break;
            }
        }
    }

    match phase {
        Phase::Covered(completeness) => {
            match completeness {
                Completeness::BestEffort { width, overflowing } => warn_time!(
                    start_time,
                    "{base}: best effort at width {width}, {overflowing} term(s) still capped, {} records",
                    found.len()
                ),
                _ => info_time!(
                    start_time,
                    "{base}: complete ({completeness:?}), {} records in {queries} queries",
                    found.len()
                ),
            }
            Ok(Expansion {
                records: found.into_records(),
                completeness,
                queries,
            })
        }
        Phase::Unresolvable(Failure::BruteForceDisabled { count }) => {
            Err(Error::BruteForceDisabled {
                cell: base.to_string(),
                count,
            })
        }
        Phase::Unresolvable(Failure::NoTerms { width }) => Err(Error::Config(format!(
            "{base}: width {width} has no terms over a {}-letter alphabet",
            plan.alphabet.len()
        ))),
        Phase::Unresolvable(Failure::CapacityExhausted) | Phase::Root | Phase::Scanning { .. } => {
            Err(Error::CapacityExhausted {
                cell: base.to_string(),
                max_width: plan.max_width,
            })
        }
    }
}
