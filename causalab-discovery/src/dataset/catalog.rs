//! Built-in datasets: encoding plans, hand-authored true graphs, and
//! background knowledge.

use super::encode::{DerivedMean, EncodingPlan, MissingPolicy, PreparedDataset, prepare};
use super::RecordBatch;
use crate::error::DatasetError;
use causalab_core::{GraphError, GraphModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// The datasets with known ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Student performance (Portuguese course).
    Student,
    /// Adult census income.
    Adult,
}

const STUDENT_NODES: &[&str] = &[
    "G_avg", "Medu", "Pstatus", "absences", "failures", "famrel", "famsup", "health", "higher",
    "internet", "paid", "schoolsup", "studytime",
];

const STUDENT_EDGES: &[(&str, &str)] = &[
    ("Medu", "G_avg"),
    ("Medu", "absences"),
    ("Medu", "higher"),
    ("Pstatus", "G_avg"),
    ("Pstatus", "absences"),
    ("Pstatus", "famrel"),
    ("failures", "G_avg"),
    ("failures", "absences"),
    ("famsup", "G_avg"),
    ("famsup", "absences"),
    ("health", "G_avg"),
    ("health", "absences"),
    ("higher", "G_avg"),
    ("internet", "G_avg"),
    ("internet", "absences"),
    ("paid", "G_avg"),
    ("schoolsup", "G_avg"),
    ("studytime", "G_avg"),
];

const ADULT_NODES: &[&str] = &[
    "age",
    "workclass",
    "education",
    "marital.status",
    "occupation",
    "relationship",
    "race",
    "sex",
    "hours.per.week",
    "native.country",
    "income",
];

const ADULT_EDGES: &[(&str, &str)] = &[
    ("age", "workclass"),
    ("education", "occupation"),
    ("marital.status", "occupation"),
    ("relationship", "income"),
    ("race", "income"),
    ("sex", "income"),
    ("hours.per.week", "income"),
    ("native.country", "income"),
    ("education", "income"),
    ("workclass", "income"),
    ("occupation", "income"),
];

const STUDENT_KEEP: &[&str] = &[
    "absences", "failures", "internet", "higher", "Medu", "health", "famsup", "Pstatus", "famrel",
    "schoolsup", "G_avg", "paid", "studytime",
];

const STUDENT_ONE_HOT: &[&str] = &["internet", "higher", "famsup", "paid"];

const WORKCLASS: &[&str] = &[
    "Private",
    "Self-emp-not-inc",
    "Self-emp-inc",
    "Federal-gov",
    "Local-gov",
    "State-gov",
    "Without-pay",
    "Never-worked",
];

const EDUCATION: &[&str] = &[
    "Preschool",
    "1st-4th",
    "5th-6th",
    "7th-8th",
    "9th",
    "10th",
    "11th",
    "12th",
    "HS-grad",
    "Some-college",
    "Assoc-acdm",
    "Assoc-voc",
    "Bachelors",
    "Masters",
    "Prof-school",
    "Doctorate",
];

const MARITAL_STATUS: &[&str] = &[
    "Married-civ-spouse",
    "Divorced",
    "Never-married",
    "Separated",
    "Widowed",
    "Married-spouse-absent",
    "Married-AF-spouse",
];

const OCCUPATION: &[&str] = &[
    "Tech-support",
    "Craft-repair",
    "Other-service",
    "Sales",
    "Exec-managerial",
    "Prof-specialty",
    "Handlers-cleaners",
    "Machine-op-inspct",
    "Adm-clerical",
    "Farming-fishing",
    "Transport-moving",
    "Priv-house-serv",
    "Protective-serv",
    "Armed-Forces",
];

const RELATIONSHIP: &[&str] = &[
    "Wife",
    "Own-child",
    "Husband",
    "Not-in-family",
    "Other-relative",
    "Unmarried",
];

const RACE: &[&str] = &[
    "White",
    "Asian-Pac-Islander",
    "Amer-Indian-Eskimo",
    "Other",
    "Black",
];

const SEX: &[&str] = &["Male", "Female"];

const NATIVE_COUNTRY: &[&str] = &[
    "United-States",
    "Cambodia",
    "England",
    "Puerto-Rico",
    "Canada",
    "Germany",
    "Outlying-US(Guam-USVI-etc)",
    "India",
    "Japan",
    "Greece",
    "South",
    "China",
    "Cuba",
    "Iran",
    "Honduras",
    "Philippines",
    "Italy",
    "Poland",
    "Jamaica",
    "Vietnam",
    "Mexico",
    "Portugal",
    "Ireland",
    "France",
    "Dominican-Republic",
    "Laos",
    "Ecuador",
    "Taiwan",
    "Haiti",
    "Columbia",
    "Hungary",
    "Guatemala",
    "Nicaragua",
    "Scotland",
    "Thailand",
    "Yugoslavia",
    "El-Salvador",
    "Trinadad&Tobago",
    "Peru",
    "Hong",
    "Holand-Netherlands",
];

/// Codes 1..=n in list order.
fn ranked(categories: &[&str]) -> BTreeMap<String, f64> {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.to_string(), (i + 1) as f64))
        .collect()
}

fn codes(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [Self::Student, Self::Adult];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Adult => "adult",
        }
    }

    /// How raw records of this dataset are encoded.
    pub fn encoding_plan(&self) -> EncodingPlan {
        match self {
            Self::Student => {
                let scale = ranked(&["1", "2", "3", "4", "5"]);
                EncodingPlan {
                    derived_means: vec![DerivedMean {
                        name: "G_avg".into(),
                        sources: strings(&["G1", "G2", "G3"]),
                    }],
                    keep: strings(STUDENT_KEEP),
                    ordinal: BTreeMap::from([
                        ("Pstatus".to_string(), codes(&[("A", 1.0), ("T", 2.0)])),
                        ("famrel".to_string(), scale.clone()),
                        ("schoolsup".to_string(), codes(&[("no", 0.0), ("yes", 1.0)])),
                        ("health".to_string(), scale),
                    ]),
                    one_hot: strings(STUDENT_ONE_HOT),
                    missing: MissingPolicy::DropRows,
                }
            }
            Self::Adult => EncodingPlan {
                derived_means: Vec::new(),
                keep: strings(ADULT_NODES),
                ordinal: BTreeMap::from([
                    ("workclass".to_string(), ranked(WORKCLASS)),
                    ("education".to_string(), ranked(EDUCATION)),
                    ("marital.status".to_string(), ranked(MARITAL_STATUS)),
                    ("occupation".to_string(), ranked(OCCUPATION)),
                    ("relationship".to_string(), ranked(RELATIONSHIP)),
                    ("race".to_string(), ranked(RACE)),
                    ("sex".to_string(), ranked(SEX)),
                    ("native.country".to_string(), ranked(NATIVE_COUNTRY)),
                    ("income".to_string(), codes(&[("<=50K", 0.0), (">50K", 1.0)])),
                ]),
                one_hot: Vec::new(),
                missing: MissingPolicy::Reject,
            },
        }
    }

    /// Encode `batch` with this dataset's plan.
    pub fn prepare(&self, batch: &RecordBatch) -> Result<PreparedDataset, DatasetError> {
        prepare(batch, &self.encoding_plan())
    }

    /// The hand-authored true graph, in raw variable names.
    pub fn true_graph(&self) -> Result<GraphModel, GraphError> {
        match self {
            Self::Student => GraphModel::from_edges(STUDENT_NODES.iter().copied(), STUDENT_EDGES),
            Self::Adult => GraphModel::from_edges(ADULT_NODES.iter().copied(), ADULT_EDGES),
        }
    }

    /// True-graph names that differ from the encoded labels.
    pub fn variable_mapping(&self) -> HashMap<String, String> {
        match self {
            Self::Student => STUDENT_ONE_HOT
                .iter()
                .map(|v| (v.to_string(), format!("{v}_yes")))
                .collect(),
            Self::Adult => HashMap::new(),
        }
    }

    /// The true graph relabeled to the encoded column names, ready to be
    /// compared against estimates.
    pub fn reference_graph(&self) -> Result<GraphModel, GraphError> {
        self.true_graph()?.relabel(&self.variable_mapping())
    }

    /// Variables no other variable may cause.
    pub fn root_variables(&self) -> &'static [&'static str] {
        match self {
            Self::Student => &[],
            Self::Adult => &["race", "age", "sex", "native.country"],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "adult" => Ok(Self::Adult),
            _ => Err(DatasetError::UnknownDataset(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_true_graph_sizes() {
        let student = DatasetKind::Student.true_graph().unwrap();
        assert_eq!((student.node_count(), student.edge_count()), (13, 18));
        assert!(student.is_acyclic());

        let adult = DatasetKind::Adult.true_graph().unwrap();
        assert_eq!((adult.node_count(), adult.edge_count()), (11, 11));
        assert!(adult.is_acyclic());
    }

    #[test]
    fn test_student_reference_uses_encoded_names() {
        let reference = DatasetKind::Student.reference_graph().unwrap();
        assert!(reference.has_edge("internet_yes", "G_avg"));
        assert!(reference.has_edge("Medu", "higher_yes"));
        assert!(!reference.has_node("internet"));
        assert_eq!(reference.edge_count(), 18);
    }

    fn student_record(internet: &str, pstatus: &str, famrel: serde_json::Value) -> serde_json::Value {
        json!({
            "school": "GP", "G1": 10, "G2": 11, "G3": 12,
            "absences": 4, "failures": 0, "internet": internet, "higher": "yes",
            "Medu": 4, "health": 3, "famsup": "no", "Pstatus": pstatus,
            "famrel": famrel, "schoolsup": "yes", "paid": "no", "studytime": 2
        })
    }

    #[test]
    fn test_student_labels_match_reference_nodes() {
        let batch = RecordBatch::from_records(vec![
            student_record("yes", "T", json!(4)),
            student_record("no", "A", json!(5)),
            student_record("yes", "A", json!(null)),
        ])
        .unwrap();
        let prepared = DatasetKind::Student.prepare(&batch).unwrap();
        assert_eq!(
            prepared.labels,
            vec![
                "absences",
                "failures",
                "Medu",
                "health",
                "Pstatus",
                "famrel",
                "schoolsup",
                "G_avg",
                "studytime",
                "internet_yes",
            ]
        );
        // Single-category one-hot columns produce no indicator.
        assert_eq!(prepared.dropped_rows, 1);
        assert_eq!(
            prepared.matrix.row(0),
            Some(&[4.0, 0.0, 4.0, 3.0, 2.0, 4.0, 1.0, 11.0, 2.0, 1.0][..])
        );
    }

    #[test]
    fn test_adult_rejects_unmapped_category() {
        let record = |country: &str| {
            json!({
                "age": 39, "workclass": "State-gov", "education": "Bachelors",
                "marital.status": "Never-married", "occupation": "Adm-clerical",
                "relationship": "Not-in-family", "race": "White", "sex": "Male",
                "hours.per.week": 40, "native.country": country, "income": "<=50K"
            })
        };
        let batch = RecordBatch::from_records(vec![record("United-States")]).unwrap();
        let prepared = DatasetKind::Adult.prepare(&batch).unwrap();
        assert_eq!(prepared.labels.len(), 11);
        assert_eq!(
            prepared.matrix.row(0),
            Some(&[39.0, 6.0, 13.0, 3.0, 9.0, 4.0, 1.0, 1.0, 40.0, 1.0, 0.0][..])
        );

        let batch = RecordBatch::from_records(vec![record("Atlantis")]).unwrap();
        assert!(matches!(
            DatasetKind::Adult.prepare(&batch),
            Err(DatasetError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Adult".parse::<DatasetKind>().unwrap(), DatasetKind::Adult);
        assert!("iris".parse::<DatasetKind>().is_err());
    }
}
