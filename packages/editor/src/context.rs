//! Explicit editing context passed to every repair and mutation call

use folio_dom::{Element, NodeId, Tree};

use crate::config::{HostCapabilities, SchemaConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::repair;
use crate::schema::{Classification, Schema};

/// Schema tables, the document root, host capabilities and the diagnostic channel
#[derive(Debug, Clone)]
pub struct EditorContext {
    pub schema: Schema,
    pub root: NodeId,
    pub diagnostics: Diagnostics,
    has_fillers: bool,
}

impl EditorContext {
    pub fn new(config: SchemaConfig, root: NodeId) -> Self {
        Self {
            schema: Schema::new(config),
            root,
            diagnostics: Diagnostics::new(),
            has_fillers: false,
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        self.schema.config()
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.schema.config().capabilities
    }

    pub fn classify(&self, tree: &Tree, node: NodeId) -> Classification {
        self.schema.classify(tree, node, self.root)
    }

    /// Fresh default block element, not yet focusable
    pub fn default_block_element(&self) -> Element {
        let config = self.config();
        Element::new(&config.block_tag).with_attributes(config.block_attributes.clone())
    }

    /// Detached default block, made focusable
    pub fn create_default_block(&mut self, tree: &mut Tree) -> NodeId {
        let block = tree.create_element(self.default_block_element());
        repair::ensure_focusable(tree, self, block);
        block
    }

    /// A zero-width filler character was placed somewhere in the tree
    pub fn note_filler_added(&mut self) {
        self.has_fillers = true;
    }

    pub fn has_fillers(&self) -> bool {
        self.has_fillers
    }

    pub(crate) fn clear_fillers_flag(&mut self) {
        self.has_fillers = false;
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }
}
