//! Rights administration.
//!
//! Drafts arrive as loosely typed editor input: a target PID string, an
//! action formal name, a principal reference and an optional criterion.
//! Every draft is validated completely before anything is written, and all
//! problems are reported together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::action::SecuredAction;
use crate::config::Config;
use crate::criterion::{
    Criterion, CriterionDescriptor, CriterionError, CriterionRegistry, CriteriumParams, ParamsId,
};
use crate::deadline::within;
use crate::directory::Directory;
use crate::error::{Error, LookupError, Result, Violation, Violations};
use crate::index::ObjectIndex;
use crate::matcher::PrincipalFilter;
use crate::matching::{for_principal, RuleMatcher};
use crate::path::PathSaturator;
use crate::pid::Pid;
use crate::principal::{Principal, PrincipalKind};
use crate::resolver::sort;
use crate::right::{Right, RightId};
use crate::store::{RuleStore, StoreResult};

/// Principal as named by an editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum PrincipalRef {
    Public,
    User(String),
    Group(String),
}

/// Parameters of a criterion draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsDraft {
    #[default]
    None,
    /// Reuse a stored parameter set.
    Existing(ParamsId),
    /// Store a new parameter set along with the right.
    New {
        objects: Vec<String>,
        #[serde(default)]
        short_description: String,
        #[serde(default)]
        long_description: String,
    },
}

impl ParamsDraft {
    /// New parameters from a `;` separated operand list, as editors submit
    /// them. Blank operands are dropped.
    pub fn delimited(objects: &str, short_description: &str, long_description: &str) -> Self {
        ParamsDraft::New {
            objects: objects
                .split(';')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect(),
            short_description: short_description.to_owned(),
            long_description: long_description.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDraft {
    pub kind: String,
    /// Signed so that negative input reaches validation.
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub params: ParamsDraft,
}

impl CriterionDraft {
    pub fn new<S: Into<String>>(kind: S) -> Self {
        CriterionDraft {
            kind: kind.into(),
            priority: None,
            params: ParamsDraft::None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_params(mut self, params: ParamsDraft) -> Self {
        self.params = params;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightDraft {
    pub target: String,
    pub action: String,
    pub principal: PrincipalRef,
    #[serde(default)]
    pub criterion: Option<CriterionDraft>,
    /// Revision the editor started from. Updates based on an older revision
    /// are refused.
    #[serde(default)]
    pub revision: Option<u64>,
}

impl RightDraft {
    pub fn new<T: Into<String>, A: Into<String>>(
        target: T,
        action: A,
        principal: PrincipalRef,
    ) -> Self {
        RightDraft {
            target: target.into(),
            action: action.into(),
            principal,
            criterion: None,
            revision: None,
        }
    }

    pub fn with_criterion(mut self, criterion: CriterionDraft) -> Self {
        self.criterion = Some(criterion);
        self
    }

    pub fn based_on(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }
}

/// A criterion that passed validation. `new_params` still has to be stored
/// and its key filled in.
struct CheckedCriterion {
    criterion: Criterion,
    new_params: Option<CriteriumParams>,
}

struct Checked {
    target: Pid,
    action: SecuredAction,
    principal: Principal,
    criterion: Option<CheckedCriterion>,
}

#[derive(Clone)]
pub struct RightsAdmin {
    store: Arc<dyn RuleStore>,
    directory: Arc<dyn Directory>,
    registry: Arc<CriterionRegistry>,
    saturator: PathSaturator,
    matcher: RuleMatcher,
    store_timeout: Duration,
    lookup_timeout: Duration,
    public_group: String,
}

impl RightsAdmin {
    pub fn new(
        index: Arc<dyn ObjectIndex>,
        store: Arc<dyn RuleStore>,
        directory: Arc<dyn Directory>,
        registry: Arc<CriterionRegistry>,
        config: &Config,
    ) -> Self {
        RightsAdmin {
            saturator: PathSaturator::new(index, config),
            matcher: RuleMatcher::new(store.clone(), config),
            store,
            directory,
            registry,
            store_timeout: config.store_timeout(),
            lookup_timeout: config.lookup_timeout(),
            public_group: config.public_group.clone(),
        }
    }

    #[tracing::instrument(skip(self, draft), fields(target = %draft.target, action = %draft.action))]
    pub async fn create(&self, draft: RightDraft) -> Result<Right> {
        let target = Pid::parse(&draft.target)
            .map_err(|_| Violation::MalformedTarget(draft.target.clone()));
        let checked = self.check(&draft, target).await?;

        let criterion = self.store_new_params(checked.criterion).await?;
        let mut right = Right::new(checked.target, checked.action, checked.principal);
        right.criterion = criterion;

        let right = self.stored(self.store.insert_right(right)).await?;
        info!(
            right = %right.id,
            target = %right.target,
            action = %right.action,
            principal = %right.principal,
            "right created"
        );
        Ok(right)
    }

    /// Replace action, principal and criterion of a stored right. The target
    /// never changes, whatever the draft says.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(&self, id: RightId, draft: RightDraft) -> Result<Right> {
        let current = self.stored(self.store.get_right(id)).await?;
        let checked = self.check(&draft, Ok(current.target.clone())).await?;

        let criterion = self.store_new_params(checked.criterion).await?;
        let right = Right {
            id: current.id,
            target: current.target,
            action: checked.action,
            principal: checked.principal,
            criterion,
            revision: current.revision,
        };
        let expected = draft.revision.unwrap_or(current.revision);

        let right = self.stored(self.store.update_right(right, expected)).await?;
        info!(right = %right.id, revision = right.revision, "right updated");
        Ok(right)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: RightId) -> Result<()> {
        self.stored(self.store.delete_right(id)).await?;
        info!(right = %id, "right deleted");
        Ok(())
    }

    /// Rights for `action` along the path of `pid`, most specific first.
    /// `None` lists rights of every principal.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_path_and_action(
        &self,
        pid: &str,
        action: SecuredAction,
        principal: Option<Principal>,
    ) -> Result<Vec<Right>> {
        let path = self.saturator.saturate(pid, None).await?;
        let candidates = self.matcher.candidates(&path, action).await?;
        let filter = PrincipalFilter::from(principal);
        Ok(sort(for_principal(candidates, &filter), &path))
    }

    pub async fn find_right(&self, id: RightId) -> Result<Right> {
        self.stored(self.store.get_right(id)).await
    }

    pub async fn all_params(&self) -> Result<Vec<CriteriumParams>> {
        self.stored(self.store.all_params()).await
    }

    pub async fn find_params(&self, id: ParamsId) -> Result<CriteriumParams> {
        self.stored(self.store.get_params(id)).await
    }

    /// Criterion kinds an editor may choose from.
    pub fn criteria(&self) -> Vec<CriterionDescriptor> {
        self.registry.descriptors().copied().collect()
    }

    /// Users or groups whose name starts with `prefix`.
    pub async fn autocomplete(&self, kind: PrincipalKind, prefix: &str) -> Result<Vec<Principal>> {
        let search = self.directory.prefix_search(kind, prefix.trim());
        Ok(self.looked_up(search).await??)
    }

    async fn check(&self, draft: &RightDraft, target: Result<Pid, Violation>) -> Result<Checked> {
        let action = SecuredAction::find_by_formal_name(draft.action.trim())
            .ok_or_else(|| Violation::UnknownAction(draft.action.clone()));
        let principal = self.principal(&draft.principal).await?;
        let criterion = match &draft.criterion {
            Some(c) => self.criterion(c).await?.map(Some),
            None => Ok(None),
        };

        match (target, action, principal, criterion) {
            (Ok(target), Ok(action), Ok(principal), Ok(criterion)) => Ok(Checked {
                target,
                action,
                principal,
                criterion,
            }),
            (target, action, principal, criterion) => {
                let mut violations = Violations::default();
                violations.extend(target.err());
                violations.extend(action.err());
                violations.extend(principal.err());
                violations.extend(criterion.err().into_iter().flatten());
                Err(violations.into_error())
            }
        }
    }

    /// Resolve a principal reference through the directory. An unknown name
    /// is a violation; an unreachable directory fails the request.
    async fn principal(&self, reference: &PrincipalRef) -> Result<Result<Principal, Violation>> {
        let lookup = match reference {
            PrincipalRef::Public => return Ok(Ok(Principal::Public)),
            PrincipalRef::Group(name) if name.trim() == self.public_group => {
                return Ok(Ok(Principal::Public))
            }
            PrincipalRef::Group(name) => {
                let find = self.directory.find_group_by_name(name.trim());
                self.looked_up(find).await?
            }
            PrincipalRef::User(login) => {
                let find = self.directory.find_user_by_login(login.trim());
                self.looked_up(find).await?
            }
        };
        match lookup {
            Ok(principal) => Ok(Ok(principal)),
            Err(LookupError::NotFound(what)) => Ok(Err(Violation::PrincipalNotFound(what))),
            Err(err) => Err(err.into()),
        }
    }

    async fn criterion(
        &self,
        draft: &CriterionDraft,
    ) -> Result<Result<CheckedCriterion, Vec<Violation>>> {
        let mut violations = Vec::new();

        let descriptor = self.registry.lookup(&draft.kind);
        if descriptor.is_none() {
            violations.push(Violation::UnknownCriterionKind(draft.kind.clone()));
        }

        let fixed_priority = match draft.priority {
            None => None,
            Some(p) => match u32::try_from(p) {
                Ok(p) => Some(p),
                Err(_) => {
                    violations.push(Violation::InvalidPriority(p));
                    None
                }
            },
        };

        let (params, new_params) = match &draft.params {
            ParamsDraft::None => (None, None),
            ParamsDraft::Existing(id) => match self.stored(self.store.get_params(*id)).await {
                Ok(stored) => (Some(stored), None),
                Err(Error::ParamsNotFound(missing)) => {
                    violations.push(Violation::ParamsNotFound(missing));
                    (None, None)
                }
                Err(err) => return Err(err),
            },
            ParamsDraft::New {
                objects,
                short_description,
                long_description,
            } => {
                let fresh = CriteriumParams::new(objects.iter().cloned())
                    .with_descriptions(short_description.as_str(), long_description.as_str());
                (Some(fresh.clone()), Some(fresh))
            }
        };

        if let Some(descriptor) = descriptor {
            let missing_existing =
                matches!(draft.params, ParamsDraft::Existing(_)) && params.is_none();
            if !missing_existing {
                let objects = params.as_ref().map(|p| p.objects.as_slice());
                match descriptor.kind.bind(objects) {
                    Ok(_) => {}
                    Err(CriterionError::MissingParams { kind }) => {
                        violations.push(Violation::MissingParams(kind.to_owned()))
                    }
                    Err(CriterionError::InvalidParams { kind, reason }) => {
                        violations.push(Violation::InvalidParams {
                            kind: kind.to_owned(),
                            reason,
                        })
                    }
                    Err(other) => violations.push(Violation::InvalidParams {
                        kind: descriptor.id.to_owned(),
                        reason: other.to_string(),
                    }),
                }
            }
        }

        if !violations.is_empty() {
            return Ok(Err(violations));
        }

        let kind = descriptor.map_or_else(|| draft.kind.clone(), |d| d.id.to_owned());
        // Kinds without operands keep no parameter reference and store none.
        let (params, new_params) = match descriptor {
            Some(d) if !d.params_necessary => (None, None),
            _ => (params, new_params),
        };
        Ok(Ok(CheckedCriterion {
            criterion: Criterion {
                kind,
                fixed_priority,
                params: params.filter(|p| p.id.is_persisted()).map(|p| p.id),
            },
            new_params,
        }))
    }

    /// Persist parameters created along with a criterion and point the
    /// criterion at them.
    async fn store_new_params(&self, checked: Option<CheckedCriterion>) -> Result<Option<Criterion>> {
        let Some(CheckedCriterion {
            mut criterion,
            new_params,
        }) = checked
        else {
            return Ok(None);
        };
        if let Some(params) = new_params {
            let stored = self.stored(self.store.insert_params(params)).await?;
            info!(params = %stored.id, "criterion parameters created");
            criterion.params = Some(stored.id);
        }
        Ok(Some(criterion))
    }

    async fn stored<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let result = within(self.store_timeout, call, || {
            Error::StoreUnavailable("rule store call timed out".into())
        })
        .await?;
        Ok(result?)
    }

    async fn looked_up<T, F>(&self, call: F) -> Result<std::result::Result<T, LookupError>>
    where
        F: Future<Output = std::result::Result<T, LookupError>>,
    {
        within(self.lookup_timeout, call, || {
            Error::Unavailable("directory call timed out".into())
        })
        .await
    }
}
