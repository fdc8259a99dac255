//! Conversion driver
//!
//! Parses source text into a `Module` tree, rewrites it and renders the
//! result in the configured output format.

use crate::config::{DriverConfig, OutputFormat};
use symlogic_core::{authorize_tree, transform, Node, TransformError, Visitor};
use symlogic_parser::{ParseError, Parser};
use thiserror::Error;
use tracing::{debug, warn};

/// Conversion error
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Failed to serialize expression tree: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Convert expression source with the default configuration
///
/// `not a and (b == 0)` becomes `And(Not(a), Eq(b, 0))`.
pub fn convert(source: &str) -> ConvertResult<String> {
    Converter::default().convert(source)
}

/// Convert expression source into the rewritten `Module` tree with the
/// default configuration
pub fn convert_tree(source: &str) -> ConvertResult<Node> {
    Converter::default().convert_tree(source)
}

/// Conversion driver holding a configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: DriverConfig,
}

impl Converter {
    /// Create a converter
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Parse source into a `Module` tree without rewriting it
    pub fn parse(&self, source: &str) -> ConvertResult<Node> {
        let tree = Parser::new(source)
            .with_max_depth(self.config.max_depth)
            .parse_module()
            .inspect_err(|e| warn!(error = %e, "Failed to parse expression"))?;
        Ok(tree)
    }

    /// Parse and rewrite source, returning the rewritten `Module` tree
    pub fn convert_tree(&self, source: &str) -> ConvertResult<Node> {
        let tree = self.parse(source)?;
        let rewritten =
            transform(&tree).inspect_err(|e| warn!(error = %e, "Rejected expression"))?;

        debug!(
            input_nodes = count_nodes(&tree),
            output_nodes = count_nodes(&rewritten),
            depth = rewritten.depth(),
            "Converted expression"
        );
        Ok(rewritten)
    }

    /// Parse and rewrite source, returning the rewritten expression text
    pub fn convert(&self, source: &str) -> ConvertResult<String> {
        Ok(self.convert_tree(source)?.to_string())
    }

    /// Check that source only uses constructs the rewrite accepts, without
    /// rewriting it
    ///
    /// Operator support is not part of the check: `a & b` passes here and
    /// fails on conversion.
    pub fn check(&self, source: &str) -> ConvertResult<()> {
        let tree = self.parse(source)?;
        authorize_tree(&tree).inspect_err(|e| warn!(error = %e, "Rejected expression"))?;
        Ok(())
    }

    /// Convert source and render it in the configured output format
    pub fn render(&self, source: &str) -> ConvertResult<String> {
        let tree = self.convert_tree(source)?;
        match self.config.format {
            OutputFormat::Text => Ok(tree.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string(&tree)?),
            OutputFormat::Tree => Ok(format!("{:#?}", tree)),
        }
    }
}

/// Count every node of a tree, keyword arguments included
fn count_nodes(node: &Node) -> usize {
    struct NodeCounter(usize);

    impl Visitor for NodeCounter {
        fn visit_node(&mut self, node: &Node) {
            self.0 += 1;
            symlogic_core::ast::walk_node(self, node);
        }

        fn visit_keyword(&mut self, keyword: &symlogic_core::Keyword) {
            self.0 += 1;
            symlogic_core::ast::walk_keyword(self, keyword);
        }
    }

    let mut counter = NodeCounter(0);
    counter.visit_node(node);
    counter.0
}
