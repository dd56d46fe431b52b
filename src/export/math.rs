//! LaTeX to Office Math conversion
//!
//! Equations reach the assembler as raw LaTeX. A [`MathConverter`] turns them
//! into a self-contained `<m:oMath>` fragment; the default implementation goes
//! through MathML with latex2mathml and then maps MathML onto OMML.

use super::equations::DisplayMode;
use super::omml::mathml_to_omml;
use latex2mathml::{latex_to_mathml, DisplayStyle};
use log::debug;

/// Marker latex2mathml leaves in its output for tokens it could not handle.
const PARSE_ERROR_MARKER: &str = "[PARSE ERROR:";

// ─────────────────────────────────────────────────────────────────────────────
// Conversion Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while converting an equation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The LaTeX source could not be parsed
    Latex(String),
    /// The intermediate MathML had no usable structure
    InvalidMathMl(String),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::Latex(msg) => write!(f, "LaTeX error: {}", msg),
            ConversionError::InvalidMathMl(msg) => write!(f, "Invalid MathML: {}", msg),
        }
    }
}

impl std::error::Error for ConversionError {}

// ─────────────────────────────────────────────────────────────────────────────
// Converter Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Converts LaTeX source into an OMML `<m:oMath>` element.
///
/// The returned fragment declares the `m` namespace itself so it stays valid
/// wherever it is embedded.
pub trait MathConverter {
    fn convert(&self, latex: &str, mode: DisplayMode) -> Result<String, ConversionError>;
}

/// LaTeX → MathML (latex2mathml) → OMML.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexOmmlConverter;

impl LatexOmmlConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert LaTeX to a MathML `<math>` element.
    pub fn to_mathml(&self, latex: &str, mode: DisplayMode) -> Result<String, ConversionError> {
        let style = match mode {
            DisplayMode::Display => DisplayStyle::Block,
            DisplayMode::Inline => DisplayStyle::Inline,
        };

        let mathml =
            latex_to_mathml(latex, style).map_err(|e| ConversionError::Latex(e.to_string()))?;

        if mathml.contains(PARSE_ERROR_MARKER) {
            return Err(ConversionError::Latex(format!(
                "unsupported command or token in '{}'",
                latex
            )));
        }
        Ok(mathml)
    }
}

impl MathConverter for LatexOmmlConverter {
    fn convert(&self, latex: &str, mode: DisplayMode) -> Result<String, ConversionError> {
        let mathml = self.to_mathml(latex, mode)?;
        debug!("MathML for '{}': {}", latex, mathml);
        mathml_to_omml(&mathml)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscript_converts() {
        let omml = LatexOmmlConverter::new()
            .convert("x^2", DisplayMode::Inline)
            .unwrap();
        assert!(omml.starts_with("<m:oMath xmlns:m="));
        assert!(omml.contains("<m:sSup>"));
        assert!(omml.ends_with("</m:oMath>"));
    }

    #[test]
    fn test_fraction_converts() {
        let omml = LatexOmmlConverter::new()
            .convert("\\frac{a}{b}", DisplayMode::Display)
            .unwrap();
        assert!(omml.contains("<m:f>"));
        assert!(omml.contains("<m:num>"));
        assert!(omml.contains("<m:den>"));
    }

    #[test]
    fn test_mathml_has_math_root() {
        let mathml = LatexOmmlConverter::new()
            .to_mathml("a + b", DisplayMode::Inline)
            .unwrap();
        assert!(mathml.contains("<math"));
    }

    #[test]
    fn test_error_display() {
        let err = ConversionError::Latex("bad".to_string());
        assert_eq!(err.to_string(), "LaTeX error: bad");
    }
}
