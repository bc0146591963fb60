use crate::request::BodyPrintLimit;
use crate::{CapturedRequest, MatchRule, ResponseSpec};
use log::{debug, warn};
use std::sync::{Arc, RwLock};

pub(crate) type SharedRuleSet = Arc<RwLock<RuleSet>>;

/// What to do with a request matching a rule.
#[derive(Clone, Debug)]
pub(crate) enum Action {
    Reply(ResponseSpec),
    PassThrough,
    Hang,
}

/// The outcome of looking up an intercepted request.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// Interception is not installed: the request takes the real network path untouched.
    Inactive,
    Reply(ResponseSpec),
    PassThrough,
    Hang,
    Unmatched,
}

struct RegisteredRule {
    rule: MatchRule,
    action: Action,
}

/// The rule registry and call history of a single backend instance.
///
/// Rules are tried in registration order and the first match wins: `RuleSet` never
/// reorders or deduplicates them.
pub(crate) struct RuleSet {
    active: bool,
    rules: Vec<RegisteredRule>,
    pass_through_all: bool,
    history: Vec<CapturedRequest>,
    body_print_limit: BodyPrintLimit,
}

impl RuleSet {
    pub(crate) fn new(body_print_limit: BodyPrintLimit) -> RuleSet {
        RuleSet {
            active: false,
            rules: vec![],
            pass_through_all: false,
            history: vec![],
            body_print_limit,
        }
    }

    pub(crate) fn shared(body_print_limit: BodyPrintLimit) -> SharedRuleSet {
        Arc::new(RwLock::new(Self::new(body_print_limit)))
    }

    pub(crate) fn resolve(&mut self, request: &CapturedRequest) -> Resolution {
        if !self.active {
            return Resolution::Inactive;
        }
        debug!("Handling request {} {}.", request.method, request.url);
        self.history.push(request.clone());

        if self.pass_through_all {
            return Resolution::PassThrough;
        }
        let action = self
            .rules
            .iter()
            .find(|registered| registered.rule.matches(request))
            .map(|registered| registered.action.clone());
        match action {
            Some(Action::Reply(spec)) => Resolution::Reply(spec),
            Some(Action::PassThrough) => Resolution::PassThrough,
            Some(Action::Hang) => Resolution::Hang,
            None => {
                let mut printed = String::new();
                let _ = request.print_with_limit(&mut printed, self.body_print_limit);
                warn!("Got unexpected request:\n{}", printed);
                Resolution::Unmatched
            }
        }
    }

    pub(crate) fn register(&mut self, rule: MatchRule, action: Action) {
        self.rules.push(RegisteredRule { rule, action });
    }

    /// Divert every request to the real network path, regardless of registered rules.
    pub(crate) fn pass_through_all(&mut self) {
        self.pass_through_all = true;
    }

    /// Drop all rules and recorded requests, then switch interception on or off.
    pub(crate) fn reset(&mut self, active: bool) {
        self.rules.clear();
        self.history.clear();
        self.pass_through_all = false;
        self.active = active;
    }

    pub(crate) fn received_requests(&self) -> Vec<CapturedRequest> {
        self.history.clone()
    }
}
