//! The catalogue of criterion kinds.
//!
//! Each kind binds its operands into a [`Predicate`], which is what actually
//! gets evaluated. Binding fails for operands the kind cannot use, so the same
//! code validates administrative input and guards evaluation.

use chrono::Datelike;
use regex::Regex;

use super::{CriterionError, EvaluatingResult};
use crate::environment::EvaluationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CriterionKind {
    /// Objects older than a number of years.
    MovingWall,
    /// Objects issued within an inclusive range of years.
    Window,
    /// Objects issued after a year.
    IssuedAfter,
    /// Requests from addresses matching a pattern.
    IpFilter,
    /// Requests from known addresses that match none of the patterns.
    StrictIpFilter,
    /// Objects of one of the listed models.
    ModelFilter,
    /// Requests from a logged in user.
    Authenticated,
}

impl CriterionKind {
    pub const ALL: [CriterionKind; 7] = [
        CriterionKind::MovingWall,
        CriterionKind::Window,
        CriterionKind::IssuedAfter,
        CriterionKind::IpFilter,
        CriterionKind::StrictIpFilter,
        CriterionKind::ModelFilter,
        CriterionKind::Authenticated,
    ];

    /// Identifier persisted with criteria.
    pub fn id(&self) -> &'static str {
        use CriterionKind::*;
        match self {
            MovingWall => "movingwall",
            Window => "window",
            IssuedAfter => "issuedafter",
            IpFilter => "ipfilter",
            StrictIpFilter => "strictipfilter",
            ModelFilter => "modelfilter",
            Authenticated => "authenticated",
        }
    }

    pub fn description(&self) -> &'static str {
        use CriterionKind::*;
        match self {
            MovingWall => "object was issued at least N years ago",
            Window => "object was issued between two years, inclusive",
            IssuedAfter => "object was issued after a year",
            IpFilter => "client address matches one of the patterns",
            StrictIpFilter => "client address is known and matches none of the patterns",
            ModelFilter => "object has one of the listed models",
            Authenticated => "requester is logged in",
        }
    }

    pub fn params_necessary(&self) -> bool {
        !matches!(self, CriterionKind::Authenticated)
    }

    /// Bind operands, producing something that can be evaluated.
    pub fn bind(&self, objects: Option<&[String]>) -> Result<Predicate, CriterionError> {
        use CriterionKind::*;

        let objects = match (self.params_necessary(), objects) {
            (false, _) => return Ok(Predicate::Authenticated),
            (true, None) => return Err(CriterionError::MissingParams { kind: self.id() }),
            (true, Some(objects)) => objects,
        };
        let invalid = |reason: String| CriterionError::InvalidParams {
            kind: self.id(),
            reason,
        };

        match self {
            MovingWall => {
                let years = single(objects).and_then(|s| parse_number(s)).map_err(invalid)?;
                if years < 0 {
                    return Err(invalid(format!("negative wall of {} years", years)));
                }
                Ok(Predicate::MovingWall { years })
            }
            IssuedAfter => {
                let year = single(objects).and_then(|s| parse_number(s)).map_err(invalid)?;
                Ok(Predicate::IssuedAfter { year })
            }
            Window => match objects {
                [from, to] => {
                    let from = parse_number(from).map_err(invalid)?;
                    let to = parse_number(to).map_err(invalid)?;
                    if from > to {
                        return Err(invalid(format!("empty window {}..{}", from, to)));
                    }
                    Ok(Predicate::Window { from, to })
                }
                _ => Err(invalid(format!("expected 2 operands, got {}", objects.len()))),
            },
            IpFilter | StrictIpFilter => {
                if objects.is_empty() {
                    return Err(invalid("no address patterns".into()));
                }
                let patterns = objects
                    .iter()
                    .map(|p| Regex::new(&format!("^(?:{})$", p.trim())))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(Predicate::Address {
                    patterns,
                    strict: *self == StrictIpFilter,
                })
            }
            ModelFilter => {
                let models: Vec<String> = objects
                    .iter()
                    .map(|m| m.trim())
                    .filter(|m| !m.is_empty())
                    .map(str::to_owned)
                    .collect();
                if models.is_empty() {
                    return Err(invalid("no models".into()));
                }
                Ok(Predicate::Model { models })
            }
            Authenticated => Ok(Predicate::Authenticated),
        }
    }
}

fn single(objects: &[String]) -> Result<&str, String> {
    match objects {
        [one] => Ok(one.as_str()),
        _ => Err(format!("expected 1 operand, got {}", objects.len())),
    }
}

fn parse_number(s: &str) -> Result<i32, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))
}

/// A criterion kind with its operands bound.
#[derive(Debug, Clone)]
pub enum Predicate {
    MovingWall { years: i32 },
    Window { from: i32, to: i32 },
    IssuedAfter { year: i32 },
    Address { patterns: Vec<Regex>, strict: bool },
    Model { models: Vec<String> },
    Authenticated,
}

impl Predicate {
    pub fn evaluate(&self, context: &EvaluationContext) -> EvaluatingResult {
        use EvaluatingResult::NotApplicable;

        let issued = context.metadata().year().map(i64::from);
        match self {
            Predicate::MovingWall { years } => match issued {
                Some(y) => {
                    let now = i64::from(context.evaluation_date().year());
                    (y + i64::from(*years) <= now).into()
                }
                None => NotApplicable,
            },
            Predicate::Window { from, to } => match issued {
                Some(y) => (i64::from(*from) <= y && y <= i64::from(*to)).into(),
                None => NotApplicable,
            },
            Predicate::IssuedAfter { year } => match issued {
                Some(y) => (y > i64::from(*year)).into(),
                None => NotApplicable,
            },
            Predicate::Address { patterns, strict } => {
                let address = context.remote_addr().map(|a| a.to_string());
                match (address, *strict) {
                    (Some(a), false) => patterns.iter().any(|p| p.is_match(&a)).into(),
                    (Some(a), true) => (!patterns.iter().any(|p| p.is_match(&a))).into(),
                    (None, false) => NotApplicable,
                    (None, true) => EvaluatingResult::False,
                }
            }
            Predicate::Model { models } => match context.model() {
                Some(model) => models.iter().any(|m| m == model).into(),
                None => NotApplicable,
            },
            Predicate::Authenticated => context.identity().login().is_some().into(),
        }
    }
}
