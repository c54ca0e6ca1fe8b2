//! Scores an original image and its enhanced variants side by side.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView2};
use tracing::{debug, instrument};

use crate::equalize::{ClaheParams, Enhancer, Method};
use crate::error::{EvalError, Result};
use crate::metrics::{ambe, entropy, std_dev, Metric};
use crate::report::slug;

/// Name under which the unmodified input appears in a comparison.
pub const ORIGINAL: &str = "ORIGINAL";

/// A named enhancement to evaluate.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    pub name: String,
    pub method: Method,
}

impl Variant {
    pub fn new(name: impl Into<String>, method: Method) -> Self {
        Self { name: name.into(), method }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonConfig {
    pub variants: Vec<Variant>,
}

impl ComparisonConfig {
    /// Checks every variant's parameters and that names stay distinct from
    /// each other and from [`ORIGINAL`], ignoring case and spacing.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::from([slug(ORIGINAL)]);
        for variant in &self.variants {
            variant.method.validate()?;
            if !seen.insert(slug(&variant.name)) {
                return Err(EvalError::DuplicateVariant(variant.name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for ComparisonConfig {
    /// Global equalization against unclipped 8x8 adaptive equalization.
    fn default() -> Self {
        Self {
            variants: vec![
                Variant::new("STD HE", Method::HE),
                Variant::new("AHE", Method::CLAHE(ClaheParams::default())),
            ],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scores {
    pub entropy: f64,
    pub contrast: f64,
    /// `None` for the original, which has nothing to be compared against.
    pub ambe: Option<f64>,
}

impl Scores {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Entropy => Some(self.entropy),
            Metric::Contrast => Some(self.contrast),
            Metric::Ambe => self.ambe,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScoredImage {
    pub name: String,
    pub image: Array2<u8>,
    pub scores: Scores,
}

/// Result table of one comparison run, original first and variants in
/// configuration order.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub entries: Vec<ScoredImage>,
}

impl Comparison {
    pub fn original(&self) -> Option<&ScoredImage> {
        self.entries.first()
    }

    pub fn variants(&self) -> &[ScoredImage] {
        self.entries.get(1..).unwrap_or(&[])
    }

    pub fn entry(&self, name: &str) -> Option<&ScoredImage> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Table cell for `(metric, variant)`.
    pub fn metric(&self, metric: Metric, variant: &str) -> Option<f64> {
        self.entry(variant).and_then(|e| e.scores.get(metric))
    }
}

fn score(image: &ArrayView2<u8>, original: Option<&ArrayView2<u8>>) -> Result<Scores> {
    Ok(Scores {
        entropy: entropy(image)?,
        contrast: std_dev(image)?,
        ambe: original.map(|o| ambe(o, image)).transpose()?,
    })
}

/// Enhances `original` with every configured variant and scores all images.
///
/// Parameters of every variant are checked before the enhancer runs. The
/// first failure aborts the whole comparison.
#[instrument(skip_all, fields(variants = config.variants.len()))]
pub fn compare<E: Enhancer + ?Sized>(
    original: &ArrayView2<u8>,
    config: &ComparisonConfig,
    enhancer: &E,
) -> Result<Comparison> {
    if original.is_empty() {
        return Err(EvalError::EmptyImage);
    }
    config.validate()?;

    let mut enhanced = Vec::with_capacity(config.variants.len());
    for variant in &config.variants {
        debug!(name = %variant.name, method = ?variant.method, "enhancing");
        let image = variant.method.apply(enhancer, original)?;
        if image.dim() != original.dim() {
            return Err(EvalError::DimensionMismatch {
                expected: original.dim(),
                actual: image.dim(),
            });
        }
        enhanced.push((variant.name.clone(), image));
    }

    let mut entries = Vec::with_capacity(enhanced.len() + 1);
    entries.push(ScoredImage {
        name: ORIGINAL.to_string(),
        image: original.to_owned(),
        scores: score(original, None)?,
    });
    for (name, image) in enhanced {
        let scores = score(&image.view(), Some(original))?;
        debug!(%name, entropy = scores.entropy, contrast = scores.contrast, ambe = ?scores.ambe, "scored");
        entries.push(ScoredImage { name, image, scores });
    }
    Ok(Comparison { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equalize::{HistogramEqualizer, TileGrid};
    use more_asserts::assert_gt;
    use std::cell::Cell;

    /// Returns its input untouched and counts how often it was asked.
    #[derive(Default)]
    struct Identity {
        calls: Cell<usize>,
    }

    impl Enhancer for Identity {
        fn global_equalize(&self, image: &ArrayView2<u8>) -> Result<Array2<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(image.to_owned())
        }

        fn adaptive_equalize(&self, image: &ArrayView2<u8>, _params: &ClaheParams) -> Result<Array2<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(image.to_owned())
        }
    }

    struct Failing;

    impl Enhancer for Failing {
        fn global_equalize(&self, image: &ArrayView2<u8>) -> Result<Array2<u8>> {
            Ok(image.to_owned())
        }

        fn adaptive_equalize(&self, _image: &ArrayView2<u8>, _params: &ClaheParams) -> Result<Array2<u8>> {
            Err(EvalError::Enhancement("provider unavailable".to_string()))
        }
    }

    struct Cropping;

    impl Enhancer for Cropping {
        fn global_equalize(&self, image: &ArrayView2<u8>) -> Result<Array2<u8>> {
            Ok(image.slice(ndarray::s![1.., ..]).to_owned())
        }

        fn adaptive_equalize(&self, image: &ArrayView2<u8>, _params: &ClaheParams) -> Result<Array2<u8>> {
            Ok(image.to_owned())
        }
    }

    fn test_image() -> Array2<u8> {
        Array2::from_shape_fn((16, 16), |(r, c)| (96 + (r * 16 + c) / 8) as u8)
    }

    #[test]
    fn test_identity_enhancer_keeps_scores() {
        let img = test_image();
        let enhancer = Identity::default();
        let result = compare(&img.view(), &ComparisonConfig::default(), &enhancer).unwrap();
        assert_eq!(enhancer.calls.get(), 2);
        assert_eq!(result.entries.len(), 3);

        let original = result.original().unwrap();
        assert_eq!(original.name, ORIGINAL);
        assert_eq!(original.scores.ambe, None);
        for variant in result.variants() {
            assert_eq!(variant.scores.ambe, Some(0.0));
            assert_eq!(variant.scores.entropy, original.scores.entropy);
            assert_eq!(variant.scores.contrast, original.scores.contrast);
        }
    }

    #[test]
    fn test_flat_image_scenario() {
        let img = Array2::from_elem((4, 4), 128u8);
        let result = compare(&img.view(), &ComparisonConfig::default(), &Identity::default()).unwrap();
        assert_eq!(result.metric(Metric::Entropy, ORIGINAL), Some(0.0));
        assert_eq!(result.metric(Metric::Contrast, ORIGINAL), Some(0.0));
        assert_eq!(result.metric(Metric::Ambe, ORIGINAL), None);
        assert_eq!(result.metric(Metric::Ambe, "STD HE"), Some(0.0));
        assert_eq!(result.metric(Metric::Entropy, "missing"), None);
    }

    #[test]
    fn test_equalization_raises_contrast() {
        let img = test_image();
        let result = compare(&img.view(), &ComparisonConfig::default(), &HistogramEqualizer).unwrap();
        let original = result.metric(Metric::Contrast, ORIGINAL).unwrap();
        assert_gt!(result.metric(Metric::Contrast, "STD HE").unwrap(), original);
        assert_gt!(result.metric(Metric::Contrast, "AHE").unwrap(), original);
        assert!(result.metric(Metric::Ambe, "STD HE").unwrap() > 0.0);
        let names = result.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec![ORIGINAL, "STD HE", "AHE"]);
    }

    #[test]
    fn test_invalid_params_rejected_before_enhancing() {
        let img = test_image();
        let config = ComparisonConfig {
            variants: vec![
                Variant::new("HE", Method::HE),
                Variant::new("bad", Method::CLAHE(ClaheParams::new(2.0, TileGrid::new(0, 8)))),
            ],
        };
        let enhancer = Identity::default();
        let err = compare(&img.view(), &config, &enhancer).unwrap_err();
        assert!(matches!(err, EvalError::InvalidTileGrid { rows: 0, cols: 8 }));
        assert_eq!(enhancer.calls.get(), 0);
    }

    #[test]
    fn test_variant_names_must_be_distinct() {
        let img = test_image();
        let enhancer = Identity::default();
        for names in [["STD HE", "std  he"], ["AHE", "Original"]] {
            let config = ComparisonConfig {
                variants: names.iter().map(|n| Variant::new(*n, Method::HE)).collect(),
            };
            let err = compare(&img.view(), &config, &enhancer).unwrap_err();
            assert!(matches!(err, EvalError::DuplicateVariant(ref name) if name == names[1]));
        }
        assert_eq!(enhancer.calls.get(), 0);
        assert!(ComparisonConfig::default().validate().is_ok());
    }

    #[test]
    fn test_enhancer_failure_yields_no_result() {
        let img = test_image();
        let err = compare(&img.view(), &ComparisonConfig::default(), &Failing).unwrap_err();
        assert!(matches!(err, EvalError::Enhancement(_)));
    }

    #[test]
    fn test_enhancer_changing_shape_is_rejected() {
        let img = test_image();
        let err = compare(&img.view(), &ComparisonConfig::default(), &Cropping).unwrap_err();
        assert!(matches!(
            err,
            EvalError::DimensionMismatch { expected: (16, 16), actual: (15, 16) }
        ));
    }

    #[test]
    fn test_empty_original_is_rejected() {
        let img: Array2<u8> = Array2::zeros((0, 4));
        let err = compare(&img.view(), &ComparisonConfig::default(), &Identity::default()).unwrap_err();
        assert!(matches!(err, EvalError::EmptyImage));
    }
}
