//! KPI definitions and the static tables shown next to the generated series.
//!
//! Every goal (value and date) is declared once here and read by both the
//! generators and the captions.

use chrono::NaiveDate;
use serde::Serialize;

use super::metrics::Direction;
use super::types::{SeriesError, invalid};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Overview,
    Marketing,
    Hr,
    Operational,
    Risks,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::Marketing,
        Tab::Hr,
        Tab::Operational,
        Tab::Risks,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Aperçu",
            Tab::Marketing => "Marketing",
            Tab::Hr => "RH",
            Tab::Operational => "Opérationnel",
            Tab::Risks => "Risques",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Kpi {
    GrossMargin,
    NetPromoterScore,
    TrainingBudgetShare,
    CompanyTurnover,
    ProjectDeliveryTime,
    CyberIncidents,
    DelayedProjects,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesShape {
    Trend,
    DecliningCount,
    BoundedRandom,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KpiGoal {
    pub value: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl KpiGoal {
    pub fn date(&self) -> Result<NaiveDate, SeriesError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| invalid("goal date is not a calendar date"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KpiDefinition {
    pub kpi: Kpi,
    pub title: &'static str,
    pub tab: Tab,
    pub shape: SeriesShape,
    pub initial_value: f64,
    pub goal: Option<KpiGoal>,
    pub unit: &'static str,
    /// Multiplier from stored values to displayed values (shares shown as %).
    pub display_scale: f64,
    pub decimals: usize,
    pub direction: Direction,
    pub goal_caption: &'static str,
}

pub const KPI_DEFINITIONS: [KpiDefinition; 7] = [
    KpiDefinition {
        kpi: Kpi::GrossMargin,
        title: "Marge brute",
        tab: Tab::Marketing,
        shape: SeriesShape::Trend,
        initial_value: 22.0,
        goal: Some(KpiGoal {
            value: 65.0,
            year: 2026,
            month: 12,
            day: 31,
        }),
        unit: "%",
        display_scale: 1.0,
        decimals: 1,
        direction: Direction::Up,
        goal_caption: "65% d'ici fin 2026",
    },
    KpiDefinition {
        kpi: Kpi::NetPromoterScore,
        title: "NPS",
        tab: Tab::Marketing,
        shape: SeriesShape::Trend,
        initial_value: 6.5,
        goal: Some(KpiGoal {
            value: 8.0,
            year: 2026,
            month: 5,
            day: 31,
        }),
        unit: "/10",
        display_scale: 1.0,
        decimals: 1,
        direction: Direction::Up,
        goal_caption: "8 d'ici mai 2026",
    },
    KpiDefinition {
        kpi: Kpi::TrainingBudgetShare,
        title: "Budget formation",
        tab: Tab::Hr,
        shape: SeriesShape::Trend,
        initial_value: 0.01,
        goal: Some(KpiGoal {
            value: 0.03,
            year: 2027,
            month: 5,
            day: 31,
        }),
        unit: "%",
        display_scale: 100.0,
        decimals: 1,
        direction: Direction::Up,
        goal_caption: "+2% (total 3.0%) d'ici mai 2027",
    },
    KpiDefinition {
        kpi: Kpi::CompanyTurnover,
        title: "Taux de turn-over",
        tab: Tab::Hr,
        shape: SeriesShape::Trend,
        initial_value: 0.18,
        goal: Some(KpiGoal {
            value: 0.10,
            year: 2027,
            month: 12,
            day: 31,
        }),
        unit: "%",
        display_scale: 100.0,
        decimals: 1,
        direction: Direction::Down,
        goal_caption: "10% d'ici fin 2027",
    },
    KpiDefinition {
        kpi: Kpi::ProjectDeliveryTime,
        title: "Temps moyen de livraison",
        tab: Tab::Operational,
        shape: SeriesShape::Trend,
        initial_value: 4.5,
        goal: Some(KpiGoal {
            value: 3.0,
            year: 2026,
            month: 1,
            day: 31,
        }),
        unit: " mois",
        display_scale: 1.0,
        decimals: 1,
        direction: Direction::Down,
        goal_caption: "3 mois d'ici janvier 2026",
    },
    KpiDefinition {
        kpi: Kpi::CyberIncidents,
        title: "Incidents cybersécurité",
        tab: Tab::Operational,
        shape: SeriesShape::DecliningCount,
        initial_value: 3.0,
        goal: Some(KpiGoal {
            value: 1.0,
            year: 2025,
            month: 9,
            day: 30,
        }),
        unit: " incidents",
        display_scale: 1.0,
        decimals: 0,
        direction: Direction::Down,
        goal_caption: "1 d'ici septembre 2025",
    },
    KpiDefinition {
        kpi: Kpi::DelayedProjects,
        title: "Projets en retard",
        tab: Tab::Operational,
        shape: SeriesShape::BoundedRandom,
        initial_value: 4.0,
        goal: None,
        unit: "",
        display_scale: 1.0,
        decimals: 0,
        direction: Direction::Down,
        goal_caption: "0 projet en retard",
    },
];

pub fn definition(kpi: Kpi) -> &'static KpiDefinition {
    let index = match kpi {
        Kpi::GrossMargin => 0,
        Kpi::NetPromoterScore => 1,
        Kpi::TrainingBudgetShare => 2,
        Kpi::CompanyTurnover => 3,
        Kpi::ProjectDeliveryTime => 4,
        Kpi::CyberIncidents => 5,
        Kpi::DelayedProjects => 6,
    };
    &KPI_DEFINITIONS[index]
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceFigure {
    pub title: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub note: &'static str,
}

pub const REFERENCE_FIGURES: [ReferenceFigure; 4] = [
    ReferenceFigure {
        title: "Chiffre d'affaires annuel",
        value: 2.5,
        unit: " M€",
        note: "Actuel",
    },
    ReferenceFigure {
        title: "Nombre de clients actifs",
        value: 35.0,
        unit: "",
        note: "Actuel",
    },
    ReferenceFigure {
        title: "Projets en cours",
        value: 12.0,
        unit: "",
        note: "dont projets en retard",
    },
    ReferenceFigure {
        title: "Dépendance clients majeurs",
        value: 55.0,
        unit: "%",
        note: "3 clients majeurs",
    },
];

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub name: &'static str,
    pub value: f64,
}

pub const TRAINING_BUDGET_BY_DEPARTMENT: [BreakdownEntry; 4] = [
    BreakdownEntry {
        name: "Développement",
        value: 40.0,
    },
    BreakdownEntry {
        name: "Marketing",
        value: 20.0,
    },
    BreakdownEntry {
        name: "RH",
        value: 15.0,
    },
    BreakdownEntry {
        name: "Opérations",
        value: 25.0,
    },
];

pub const TURNOVER_BY_DEPARTMENT: [BreakdownEntry; 4] = [
    BreakdownEntry {
        name: "Développement",
        value: 12.0,
    },
    BreakdownEntry {
        name: "Opérations",
        value: 15.0,
    },
    BreakdownEntry {
        name: "Commercial",
        value: 8.0,
    },
    BreakdownEntry {
        name: "Support Client",
        value: 10.0,
    },
];

/// Share of each entry in the breakdown total, in percent.
pub fn breakdown_shares(entries: &[BreakdownEntry]) -> Vec<f64> {
    let total: f64 = entries.iter().map(|e| e.value).sum();
    if total <= 0.0 {
        return vec![0.0; entries.len()];
    }
    entries.iter().map(|e| e.value / total * 100.0).collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Risk {
    pub name: &'static str,
    pub severity: u8,
    pub probability: u8,
    pub prevention_plan: &'static str,
    pub reparability_plan: &'static str,
}

impl Risk {
    pub fn criticality(&self) -> u16 {
        u16::from(self.severity) * u16::from(self.probability)
    }
}

pub const RISKS: [Risk; 11] = [
    Risk {
        name: "Non-respect des délais",
        severity: 4,
        probability: 4,
        prevention_plan: "Améliorer la planification et le suivi de projet",
        reparability_plan: "Mobilisation d’une équipe en urgence, pénalités à négocier",
    },
    Risk {
        name: "Sous-effectif",
        severity: 4,
        probability: 3,
        prevention_plan: "Renforcer la politique de recrutement",
        reparability_plan: "Externalisation temporaire ou intérim",
    },
    Risk {
        name: "Surcharge des équipes",
        severity: 3,
        probability: 4,
        prevention_plan: "Rééquilibrer la charge par la priorisation et l'automatisation",
        reparability_plan: "Réaffectation des priorités, aide ponctuelle",
    },
    Risk {
        name: "Gestion inefficace des projets complexes",
        severity: 4,
        probability: 3,
        prevention_plan: "Former les chefs de projets, mettre en place des outils adaptés",
        reparability_plan: "Consultants externes ou PMO de secours",
    },
    Risk {
        name: "Érosion des marges",
        severity: 4,
        probability: 3,
        prevention_plan: "Mieux chiffrer les projets, optimiser les coûts internes",
        reparability_plan: "Révision des prix ou recentrage sur projets rentables",
    },
    Risk {
        name: "Dépendance à un nombre limité de clients",
        severity: 5,
        probability: 2,
        prevention_plan: "Diversifier le portefeuille client",
        reparability_plan: "Négociation avec d’autres clients, plan de redressement",
    },
    Risk {
        name: "Perte de compétences clés",
        severity: 4,
        probability: 3,
        prevention_plan: "Mettre en place un plan de fidélisation des talents",
        reparability_plan: "Recrutement rapide, documentation des savoirs critiques",
    },
    Risk {
        name: "Insuffisance dans le développement des compétences",
        severity: 3,
        probability: 3,
        prevention_plan: "Augmenter le budget formation, créer un parcours de développement",
        reparability_plan: "Formations express, tutorat interne",
    },
    Risk {
        name: "Cybersécurité",
        severity: 5,
        probability: 2,
        prevention_plan: "Renforcer les dispositifs de sécurité, former les équipes",
        reparability_plan: "Réponse technique rapide, audit post-incident",
    },
    Risk {
        name: "Détérioration de la satisfaction client",
        severity: 4,
        probability: 3,
        prevention_plan: "Mieux gérer les retours clients et mesurer régulièrement la satisfaction",
        reparability_plan: "Geste commercial, réajustement de la prestation",
    },
    Risk {
        name: "Perte d’attractivité de l’entreprise",
        severity: 3,
        probability: 3,
        prevention_plan: "Travailler sur la QVT, la marque employeur et les parcours internes",
        reparability_plan: "Campagne de recrutement ciblée, actions RH rapides",
    },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskView {
    pub name: &'static str,
    pub severity: u8,
    pub probability: u8,
    pub criticality: u16,
    pub prevention_plan: &'static str,
    pub reparability_plan: &'static str,
}

impl From<&Risk> for RiskView {
    fn from(risk: &Risk) -> Self {
        Self {
            name: risk.name,
            severity: risk.severity,
            probability: risk.probability,
            criticality: risk.criticality(),
            prevention_plan: risk.prevention_plan,
            reparability_plan: risk.reparability_plan,
        }
    }
}

pub fn risk_register() -> Vec<RiskView> {
    RISKS.iter().map(RiskView::from).collect()
}
