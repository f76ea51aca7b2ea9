//! Reader and evaluator for LightGBM text model dumps
//!
//! Supports single-output regression boosters with numerical splits, which is
//! what `Booster.save_model()` writes for the healthcare cost model.
//! Categorical splits, linear trees and multiclass models are rejected at load
//! time rather than evaluated incorrectly.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use super::{ModelError, Scorer};

/// |x| below this counts as zero for zero-as-missing splits
const ZERO_THRESHOLD: f64 = 1e-35;

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn from_decision(decision: u8) -> Option<Self> {
        match (decision >> 2) & 3 {
            0 => Some(Self::None),
            1 => Some(Self::Zero),
            2 => Some(Self::NaN),
            _ => None,
        }
    }
}

/// Transform applied to the raw tree sum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTransform {
    Identity,
    Exp,
}

impl OutputTransform {
    fn for_objective(objective: &str) -> Result<Self, ModelError> {
        let mut tokens = objective.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        if tokens.any(|t| t == "sqrt") {
            return Err(ModelError::Unsupported(format!(
                "objective '{}' with sqrt label transform",
                objective
            )));
        }

        match name {
            "regression" | "regression_l1" | "huber" | "fair" | "quantile" | "mape" => {
                Ok(Self::Identity)
            }
            "poisson" | "gamma" | "tweedie" => Ok(Self::Exp),
            other => Err(ModelError::Unsupported(format!("objective '{}'", other))),
        }
    }

    fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Exp => raw.exp(),
        }
    }
}

/// One regression tree in LightGBM's array layout
///
/// Internal nodes are indexed `0..num_leaves - 1`. A negative child `c`
/// points at leaf `!c`.
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    split_feature: Vec<usize>,
    threshold: Vec<f64>,
    decision_type: Vec<u8>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    leaf_value: Vec<f64>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        if self.split_feature.is_empty() {
            return self.leaf_value[0];
        }

        let mut node: i32 = 0;
        while node >= 0 {
            let idx = node as usize;
            node = if self.goes_left(idx, row[self.split_feature[idx]]) {
                self.left_child[idx]
            } else {
                self.right_child[idx]
            };
        }
        self.leaf_value[(!node) as usize]
    }

    fn goes_left(&self, node: usize, value: f64) -> bool {
        let decision = self.decision_type[node];
        // Validated at load time
        let missing = MissingType::from_decision(decision).unwrap_or(MissingType::None);

        let mut value = value;
        if value.is_nan() && missing != MissingType::NaN {
            value = 0.0;
        }

        let is_missing = match missing {
            MissingType::None => false,
            MissingType::Zero => (-ZERO_THRESHOLD..=ZERO_THRESHOLD).contains(&value),
            MissingType::NaN => value.is_nan(),
        };
        if is_missing {
            return decision & DEFAULT_LEFT_MASK != 0;
        }

        value <= self.threshold[node]
    }
}

/// Key/value lines of the header or of one `Tree=` block
struct Section<'a> {
    start_line: usize,
    values: HashMap<&'a str, (usize, &'a str)>,
    flags: Vec<&'a str>,
}

impl<'a> Section<'a> {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            values: HashMap::new(),
            flags: Vec::new(),
        }
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| *f == flag)
    }

    fn raw(&self, key: &str) -> Option<(usize, &'a str)> {
        self.values.get(key).copied()
    }

    fn scalar<T>(&self, key: &str) -> Result<Option<T>, ModelError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key) {
            None => Ok(None),
            Some((line, value)) => value.trim().parse().map(Some).map_err(|e| ModelError::Parse {
                line,
                message: format!("invalid {} '{}': {}", key, value, e),
            }),
        }
    }

    fn required<T>(&self, key: &str) -> Result<T, ModelError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.scalar(key)?.ok_or_else(|| ModelError::Parse {
            line: self.start_line,
            message: format!("missing required key '{}'", key),
        })
    }

    /// Space-separated list; an absent key yields an empty list
    fn array<T>(&self, key: &str) -> Result<(usize, Vec<T>), ModelError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some((line, value)) = self.raw(key) else {
            return Ok((self.start_line, Vec::new()));
        };

        let items = value
            .split_whitespace()
            .map(|item| {
                item.parse().map_err(|e| ModelError::Parse {
                    line,
                    message: format!("invalid {} entry '{}': {}", key, item, e),
                })
            })
            .collect::<Result<Vec<T>, _>>()?;
        Ok((line, items))
    }
}

fn split_sections(text: &str) -> (Section<'_>, Vec<Section<'_>>) {
    let mut header = Section::new(1);
    let mut trees = Vec::new();
    let mut current: Option<Section> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();

        if line == "end of trees" {
            break;
        }
        if line.starts_with("Tree=") {
            if let Some(tree) = current.take() {
                trees.push(tree);
            }
            current = Some(Section::new(line_no));
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let target = match current.as_mut() {
            Some(tree) => tree,
            None => &mut header,
        };
        match line.split_once('=') {
            Some((key, value)) => {
                target.values.insert(key, (line_no, value));
            }
            None => target.flags.push(line),
        }
    }

    if let Some(tree) = current.take() {
        trees.push(tree);
    }

    (header, trees)
}

fn check_len(key: &str, line: usize, actual: usize, expected: usize) -> Result<(), ModelError> {
    if actual != expected {
        return Err(ModelError::Parse {
            line,
            message: format!("{} has {} entries, expected {}", key, actual, expected),
        });
    }
    Ok(())
}

fn parse_tree(section: &Section<'_>, num_features: usize) -> Result<Tree, ModelError> {
    let num_leaves: usize = section.required("num_leaves")?;
    if num_leaves == 0 {
        return Err(ModelError::Parse {
            line: section.start_line,
            message: "num_leaves must be at least 1".to_string(),
        });
    }
    if section.scalar::<usize>("num_cat")?.unwrap_or(0) > 0 {
        return Err(ModelError::Unsupported("categorical splits".to_string()));
    }
    if section.scalar::<u8>("is_linear")?.unwrap_or(0) != 0 {
        return Err(ModelError::Unsupported("linear trees".to_string()));
    }

    let internal = num_leaves - 1;
    let (leaf_line, leaf_value) = section.array::<f64>("leaf_value")?;
    let (feature_line, split_feature) = section.array::<usize>("split_feature")?;
    let (threshold_line, threshold) = section.array::<f64>("threshold")?;
    let (decision_line, decision_type) = section.array::<u8>("decision_type")?;
    let (left_line, left_child) = section.array::<i32>("left_child")?;
    let (right_line, right_child) = section.array::<i32>("right_child")?;

    check_len("leaf_value", leaf_line, leaf_value.len(), num_leaves)?;
    check_len("split_feature", feature_line, split_feature.len(), internal)?;
    check_len("threshold", threshold_line, threshold.len(), internal)?;
    check_len("decision_type", decision_line, decision_type.len(), internal)?;
    check_len("left_child", left_line, left_child.len(), internal)?;
    check_len("right_child", right_line, right_child.len(), internal)?;

    for node in 0..internal {
        if split_feature[node] >= num_features {
            return Err(ModelError::Parse {
                line: feature_line,
                message: format!(
                    "node {} splits on feature {} but the model has {} features",
                    node, split_feature[node], num_features
                ),
            });
        }
        if decision_type[node] & CATEGORICAL_MASK != 0 {
            return Err(ModelError::Unsupported("categorical splits".to_string()));
        }
        if MissingType::from_decision(decision_type[node]).is_none() {
            return Err(ModelError::Parse {
                line: decision_line,
                message: format!("node {} has invalid decision_type {}", node, decision_type[node]),
            });
        }

        for (line, child) in [(left_line, left_child[node]), (right_line, right_child[node])] {
            let valid = if child >= 0 {
                // Children are always created after their parent
                let child = child as usize;
                child > node && child < internal
            } else {
                ((!child) as usize) < num_leaves
            };
            if !valid {
                return Err(ModelError::Parse {
                    line,
                    message: format!("node {} has out-of-range child {}", node, child),
                });
            }
        }
    }

    Ok(Tree {
        split_feature,
        threshold,
        decision_type,
        left_child,
        right_child,
        leaf_value,
    })
}

/// A loaded LightGBM booster
#[derive(Debug, Clone, PartialEq)]
pub struct LightGbmModel {
    trees: Vec<Tree>,
    num_features: usize,
    feature_names: Vec<String>,
    objective: String,
    transform: OutputTransform,
    average_output: bool,
}

impl LightGbmModel {
    /// Read a model from a `save_model()` text file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn transform(&self) -> OutputTransform {
        self.transform
    }

    fn parse(text: &str) -> Result<Self, ModelError> {
        let (header, sections) = split_sections(text);

        let num_class: usize = header.scalar("num_class")?.unwrap_or(1);
        if num_class != 1 {
            return Err(ModelError::Unsupported(format!("{} classes", num_class)));
        }
        let per_iteration: usize = header.scalar("num_tree_per_iteration")?.unwrap_or(1);
        if per_iteration != 1 {
            return Err(ModelError::Unsupported(format!(
                "{} trees per iteration",
                per_iteration
            )));
        }

        let max_feature_idx: usize = header.required("max_feature_idx")?;
        let num_features = max_feature_idx.checked_add(1).ok_or_else(|| {
            let (line, _) = header.raw("max_feature_idx").unwrap_or((1, ""));
            ModelError::Parse {
                line,
                message: format!("max_feature_idx {} is out of range", max_feature_idx),
            }
        })?;

        let feature_names: Vec<String> = header
            .raw("feature_names")
            .map(|(_, names)| names.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        if !feature_names.is_empty() && feature_names.len() != num_features {
            let (line, _) = header.raw("feature_names").unwrap_or((1, ""));
            return Err(ModelError::Parse {
                line,
                message: format!(
                    "{} feature names for {} features",
                    feature_names.len(),
                    num_features
                ),
            });
        }

        let objective: String = header.required("objective")?;
        let transform = OutputTransform::for_objective(&objective)?;

        if sections.is_empty() {
            return Err(ModelError::Parse {
                line: 1,
                message: "model contains no trees".to_string(),
            });
        }
        let trees = sections
            .iter()
            .map(|section| parse_tree(section, num_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            num_features,
            feature_names,
            objective,
            transform,
            average_output: header.has_flag("average_output"),
        })
    }
}

impl FromStr for LightGbmModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Scorer for LightGbmModel {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn objective(&self) -> &str {
        &self.objective
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.num_features {
            return Err(ModelError::FeatureCount {
                expected: self.num_features,
                actual: row.len(),
            });
        }

        let mut raw: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        if self.average_output {
            raw /= self.trees.len() as f64;
        }

        let score = self.transform.apply(raw);
        if !score.is_finite() {
            return Err(ModelError::NonFinite(score));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PredictError};

    // Two features: x0 split at 10, x1 split at 0.5 with NaN default-right
    const SMALL_MODEL: &str = "tree
version=v4
num_class=1
num_tree_per_iteration=1
label_index=0
max_feature_idx=1
objective=regression
feature_names=x0 x1
feature_infos=[0:100] [0:1]
tree_sizes=300 200

Tree=0
num_leaves=3
num_cat=0
split_feature=0 1
split_gain=10 5
threshold=10 0.5
decision_type=2 8
left_child=-1 -2
right_child=1 -3
leaf_value=1 2 3
leaf_weight=1 1 1
leaf_count=1 1 1
internal_value=0 0
internal_weight=0 0
internal_count=3 2
is_linear=0
shrinkage=1


Tree=1
num_leaves=1
num_cat=0
split_feature=
split_gain=
threshold=
decision_type=
left_child=
right_child=
leaf_value=0.5
leaf_weight=
leaf_count=
internal_value=
internal_weight=
internal_count=
is_linear=0
shrinkage=1


end of trees

feature_importances:
x0=1
x1=1

parameters:
[boosting: gbdt]
[objective: regression]
end of parameters

pandas_categorical:null
";

    fn small_model() -> LightGbmModel {
        SMALL_MODEL.parse().unwrap()
    }

    #[test]
    fn test_parse_header() {
        let model = small_model();
        assert_eq!(model.num_features(), 2);
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.feature_names(), &["x0".to_string(), "x1".to_string()]);
        assert_eq!(model.objective(), "regression");
        assert_eq!(model.transform(), OutputTransform::Identity);
    }

    #[test]
    fn test_predict_left_leaf() {
        let model = small_model();
        assert_eq!(model.predict_row(&[5.0, 1.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_threshold_boundary_goes_left() {
        let model = small_model();
        assert_eq!(model.predict_row(&[10.0, 1.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_predict_second_level() {
        let model = small_model();
        assert_eq!(model.predict_row(&[20.0, 0.0]).unwrap(), 2.5);
        assert_eq!(model.predict_row(&[20.0, 1.0]).unwrap(), 3.5);
    }

    #[test]
    fn test_nan_uses_default_direction() {
        // decision_type 8 = NaN missing, default right
        let model = small_model();
        assert_eq!(model.predict_row(&[20.0, f64::NAN]).unwrap(), 3.5);
        // x0 has no missing type, NaN is treated as zero
        assert_eq!(model.predict_row(&[f64::NAN, 1.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let model = small_model();
        let err = model.predict_row(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCount {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_average_output() {
        let text = SMALL_MODEL.replace("tree_sizes", "average_output\ntree_sizes");
        let model: LightGbmModel = text.parse().unwrap();
        assert_eq!(model.predict_row(&[5.0, 1.0]).unwrap(), 0.75);
    }

    #[test]
    fn test_poisson_objective_exponentiates() {
        let text = SMALL_MODEL.replace("objective=regression", "objective=poisson");
        let model: LightGbmModel = text.parse().unwrap();
        let score = model.predict_row(&[5.0, 1.0]).unwrap();
        assert!((score - 1.5f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_multiclass() {
        let text = SMALL_MODEL.replace("num_class=1", "num_class=3");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(matches!(err, ModelError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_unknown_objective() {
        let text = SMALL_MODEL.replace("objective=regression", "objective=lambdarank");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(err.to_string().contains("lambdarank"));
    }

    #[test]
    fn test_rejects_categorical_split() {
        let text = SMALL_MODEL.replace("decision_type=2 8", "decision_type=3 8");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(matches!(err, ModelError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_backward_child_link() {
        let text = SMALL_MODEL.replace("right_child=1 -3", "right_child=0 -3");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        match err {
            ModelError::Parse { line, message } => {
                assert_eq!(line, 20);
                assert!(message.contains("out-of-range child"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_split_on_missing_feature() {
        let text = SMALL_MODEL.replace("split_feature=0 1", "split_feature=0 7");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(err.to_string().contains("feature 7"));
    }

    #[test]
    fn test_rejects_short_leaf_array() {
        let text = SMALL_MODEL.replace("leaf_value=1 2 3", "leaf_value=1 2");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(err.to_string().contains("leaf_value has 2 entries, expected 3"));
    }

    #[test]
    fn test_rejects_missing_max_feature_idx() {
        let text = SMALL_MODEL.replace("max_feature_idx=1\n", "");
        let err = text.parse::<LightGbmModel>().unwrap_err();
        assert!(err.to_string().contains("max_feature_idx"));
    }

    #[test]
    fn test_rejects_overflowing_max_feature_idx() {
        let text = format!(
            "tree\nmax_feature_idx={}\nobjective=regression\n\nTree=0\nnum_leaves=1\nleaf_value=1\n",
            usize::MAX
        );
        let err = text.parse::<LightGbmModel>().unwrap_err();
        match err {
            ModelError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("out of range"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_poisson_score_is_non_finite() {
        let text = SMALL_MODEL
            .replace("objective=regression", "objective=poisson")
            .replace("leaf_value=1 2 3", "leaf_value=1000 2 3");
        let model: LightGbmModel = text.parse().unwrap();

        let err = model.predict_row(&[5.0, 1.0]).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite(score) if score.is_infinite()));

        let err: PredictError = err.into();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_rejects_empty_model() {
        let err = "tree\nmax_feature_idx=0\nobjective=regression\n"
            .parse::<LightGbmModel>()
            .unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = LightGbmModel::from_file(Path::new("/nonexistent/model.txt")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
