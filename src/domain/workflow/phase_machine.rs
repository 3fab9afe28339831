//! Table-driven phase transitions.
//!
//! Every phase declares which pipeline runs for which intent and where the
//! conversation goes next. Override rules sit on top and may jump to a
//! phase regardless of where the conversation is.

use std::collections::{HashMap, HashSet};

use super::{IntentLabel, PipelineResult, PipelineSpec, ShortCircuitWhen, StageKind, StageStep, WorkflowError};
use crate::domain::session::Phase;

/// Intents handled the same way inside one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRoute {
    pub intents: Vec<IntentLabel>,
    /// Working phase while the pipeline runs. The session stays here if
    /// the pipeline fails or asks for clarification.
    pub enter: Phase,
    pub pipeline: PipelineSpec,
    /// Default next phase on success.
    pub next: Phase,
}

impl IntentRoute {
    pub fn new(intents: Vec<IntentLabel>, enter: Phase, pipeline: PipelineSpec, next: Phase) -> Self {
        Self {
            intents,
            enter,
            pipeline,
            next,
        }
    }

    /// A route used when no other route of the phase matches.
    pub fn fallback(enter: Phase, pipeline: PipelineSpec, next: Phase) -> Self {
        Self::new(Vec::new(), enter, pipeline, next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRoutes {
    pub routes: Vec<IntentRoute>,
    pub fallback: IntentRoute,
}

/// An out-of-band jump triggered by an intent, regardless of phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    pub name: String,
    pub intent: IntentLabel,
    pub requires_selected_artifact: bool,
    pub route: IntentRoute,
}

/// The declarative phase table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTable {
    phases: HashMap<Phase, PhaseRoutes>,
    overrides: Vec<OverrideRule>,
}

impl PhaseTable {
    pub fn new() -> Self {
        Self {
            phases: HashMap::new(),
            overrides: Vec::new(),
        }
    }

    pub fn with_phase(mut self, phase: Phase, routes: Vec<IntentRoute>, fallback: IntentRoute) -> Self {
        self.phases.insert(phase, PhaseRoutes { routes, fallback });
        self
    }

    pub fn with_override(mut self, rule: OverrideRule) -> Self {
        self.overrides.push(rule);
        self
    }

    pub fn routes_for(&self, phase: Phase) -> Option<&PhaseRoutes> {
        self.phases.get(&phase)
    }

    pub fn overrides(&self) -> &[OverrideRule] {
        &self.overrides
    }

    fn all_routes(&self) -> impl Iterator<Item = &IntentRoute> {
        self.phases
            .values()
            .flat_map(|p| p.routes.iter().chain(std::iter::once(&p.fallback)))
            .chain(self.overrides.iter().map(|o| &o.route))
    }

    /// The standard mockup workflow.
    pub fn standard() -> Self {
        use IntentLabel::*;
        use Phase::*;

        let requirements = PipelineSpec::new(
            "requirements",
            vec![
                StageStep::new(StageKind::Requirements),
                StageStep::new(StageKind::Recommend)
                    .short_circuit(ShortCircuitWhen::SingleCandidate, Selection),
                StageStep::new(StageKind::Questions),
            ],
        );
        let recommendation = PipelineSpec::new(
            "recommendation",
            vec![
                StageStep::new(StageKind::Recommend)
                    .short_circuit(ShortCircuitWhen::SingleCandidate, Selection),
                StageStep::new(StageKind::Questions),
            ],
        );
        let select = PipelineSpec::new("select", vec![StageKind::Select]);
        let edit = PipelineSpec::new("edit", vec![StageKind::Edit]);
        let report = PipelineSpec::new("report", vec![StageKind::Report]);
        let chat = PipelineSpec::new("chat", vec![StageKind::Format]);
        let explain = |phase: Phase| PipelineSpec::canned("explain", explanation(phase));

        Self::new()
            .with_phase(
                Initial,
                vec![
                    IntentRoute::new(vec![CreateMockup], RequirementsGathering, requirements.clone(), Recommendation),
                    IntentRoute::new(vec![RequestRecommendations], Recommendation, recommendation.clone(), Recommendation),
                ],
                IntentRoute::fallback(Initial, PipelineSpec::canned("welcome", WELCOME_TEXT), Initial),
            )
            .with_phase(
                RequirementsGathering,
                vec![IntentRoute::new(vec![NotUnderstood], RequirementsGathering, explain(RequirementsGathering), RequirementsGathering)],
                IntentRoute::fallback(RequirementsGathering, requirements, Recommendation),
            )
            .with_phase(
                Recommendation,
                vec![
                    IntentRoute::new(vec![SelectTemplate, Confirmation], Recommendation, select, Selection),
                    IntentRoute::new(vec![QuestionAnswer, Clarification, Modification], Recommendation, recommendation, Recommendation),
                    IntentRoute::new(vec![NotUnderstood], Recommendation, explain(Recommendation), Recommendation),
                ],
                IntentRoute::fallback(Recommendation, chat.clone(), Recommendation),
            )
            .with_phase(
                Selection,
                vec![
                    IntentRoute::new(vec![EditRequest, Modification], Selection, edit.clone(), Editing),
                    IntentRoute::new(vec![Report, Confirmation], Selection, report.clone(), ReportReady),
                    IntentRoute::new(vec![NotUnderstood], Selection, explain(Selection), Selection),
                ],
                IntentRoute::fallback(Selection, chat.clone(), Selection),
            )
            .with_phase(
                Editing,
                vec![
                    IntentRoute::new(vec![Modification, Clarification], Editing, edit.clone(), Editing),
                    IntentRoute::new(vec![Report, Confirmation], Editing, report, ReportReady),
                    IntentRoute::new(vec![NotUnderstood], Editing, explain(Editing), Editing),
                ],
                IntentRoute::fallback(Editing, chat.clone(), Editing),
            )
            .with_phase(
                ReportReady,
                vec![
                    IntentRoute::new(vec![Modification], ReportReady, edit.clone(), Editing),
                    IntentRoute::new(vec![NotUnderstood], ReportReady, explain(ReportReady), ReportReady),
                ],
                IntentRoute::fallback(ReportReady, chat, ReportReady),
            )
            .with_override(OverrideRule {
                name: "edit_selected_template".to_string(),
                intent: EditOverride,
                requires_selected_artifact: true,
                route: IntentRoute::new(vec![EditOverride], Editing, edit, Editing),
            })
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::standard()
    }
}

const WELCOME_TEXT: &str = "Welcome! I can help you design a UI mockup. \
Tell me what kind of page you'd like to build, for example a login page, \
a dashboard, or a landing page, and I'll recommend templates that fit.";

fn explanation(phase: Phase) -> &'static str {
    match phase {
        Phase::RequirementsGathering | Phase::Initial => {
            "Let me explain. I'm collecting what your page needs: its purpose, \
             audience, style and key features. Describe any of these in your own words."
        }
        Phase::Recommendation => {
            "Let me explain. I've suggested templates that match your needs. \
             Choose one by saying its name or number, or answer a question so I can narrow them down."
        }
        Phase::Selection => {
            "Let me explain. You've picked a template. You can ask for changes, \
             like \"make the header blue\", or ask me to generate the final report."
        }
        Phase::Editing => {
            "Let me explain. I'm applying your changes to the template. \
             Describe another change, or say you're done to generate the report."
        }
        Phase::ReportReady => {
            "Let me explain. Your report is ready. You can still ask for changes \
             and I'll update the mockup."
        }
    }
}

/// Why a route was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    Override(String),
    Intent(IntentLabel),
    Fallback(IntentLabel),
    Resume(StageKind),
}

/// The route chosen for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub from: Phase,
    pub working_phase: Phase,
    pub pipeline: PipelineSpec,
    pub default_next: Phase,
    pub source: RouteSource,
}

impl Route {
    fn from_intent_route(from: Phase, route: &IntentRoute, source: RouteSource) -> Self {
        Self {
            from,
            working_phase: route.enter,
            pipeline: route.pipeline.clone(),
            default_next: route.next,
            source,
        }
    }
}

/// Owns the phase table and answers routing questions.
#[derive(Debug, Clone)]
pub struct PhaseStateMachine {
    table: PhaseTable,
    declared: HashMap<Phase, HashSet<Phase>>,
}

impl PhaseStateMachine {
    /// Builds a machine, checking that every phase has routes.
    pub fn new(table: PhaseTable) -> Result<Self, WorkflowError> {
        if let Some(missing) = Phase::ALL.iter().find(|p| table.routes_for(**p).is_none()) {
            return Err(WorkflowError::MissingPhase(*missing));
        }
        Ok(Self::build(table))
    }

    /// The machine for [`PhaseTable::standard`].
    pub fn standard() -> Self {
        Self::build(PhaseTable::standard())
    }

    fn build(table: PhaseTable) -> Self {
        let mut declared: HashMap<Phase, HashSet<Phase>> = HashMap::new();
        for route in table.all_routes() {
            let targets = declared.entry(route.enter).or_default();
            targets.insert(route.enter);
            targets.insert(route.next);
            targets.extend(route.pipeline.short_circuit_targets());
        }

        Self { table, declared }
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    /// Returns true if a turn working in `from` may end in `to`.
    ///
    /// Self-loops are only declared for phases some route enters.
    pub fn is_declared(&self, from: Phase, to: Phase) -> bool {
        self.declared
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// The override route for this intent, if one applies.
    pub fn check_override(&self, phase: Phase, intent: IntentLabel, has_selected_artifact: bool) -> Option<Route> {
        self.table
            .overrides
            .iter()
            .find(|rule| rule.intent == intent && (!rule.requires_selected_artifact || has_selected_artifact))
            .map(|rule| Route::from_intent_route(phase, &rule.route, RouteSource::Override(rule.name.clone())))
    }

    /// Ordinary phase-local routing.
    pub fn route(&self, phase: Phase, intent: IntentLabel) -> Result<Route, WorkflowError> {
        let routes = self
            .table
            .routes_for(phase)
            .ok_or(WorkflowError::MissingPhase(phase))?;

        let route = routes
            .routes
            .iter()
            .find(|r| r.intents.contains(&intent))
            .map(|r| Route::from_intent_route(phase, r, RouteSource::Intent(intent)))
            .unwrap_or_else(|| Route::from_intent_route(phase, &routes.fallback, RouteSource::Fallback(intent)));
        Ok(route)
    }

    /// Route that re-runs the pipeline which asked `stage`'s clarification.
    pub fn resume(&self, phase: Phase, stage: StageKind) -> Option<Route> {
        let routes = self.table.routes_for(phase)?;
        routes
            .routes
            .iter()
            .chain(std::iter::once(&routes.fallback))
            .chain(self.table.overrides.iter().map(|o| &o.route).filter(|r| r.enter == phase))
            .find(|r| r.pipeline.contains(stage))
            .map(|r| Route::from_intent_route(phase, r, RouteSource::Resume(stage)))
    }

    /// Decides where the conversation goes after the pipeline ran.
    ///
    /// A stage-level override beats the route default. Failures and
    /// clarification requests keep the working phase.
    pub fn next_phase(&self, route: &Route, result: &PipelineResult) -> Result<Phase, WorkflowError> {
        let target = if !result.success || result.needs_clarification() {
            route.working_phase
        } else {
            result.phase_override.unwrap_or(route.default_next)
        };

        if !self.is_declared(route.working_phase, target) {
            tracing::error!(
                from = %route.working_phase,
                to = %target,
                pipeline = %route.pipeline.name,
                "rejected transition to undeclared phase"
            );
            return Err(WorkflowError::PhaseInvariantViolation {
                from: route.working_phase,
                to: target,
            });
        }
        Ok(target)
    }
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self::standard()
    }
}
