//! # Document
//!
//! Owns the node arena and the services formatters consult, and runs the
//! two passes of a render:
//!
//! 1. [`Document::format`] applies the formatter chains to the whole tree.
//! 2. [`Document::draw`] emits drawing tasks for every page into a
//!    [`DrawingTaskHeap`] and drains it into an [`Engine`].
//!
//! A document is drawn once. [`Document::initialize`] restores the tree as it
//! was before formatting so the document can be formatted and drawn again.

use crate::config::LayoutConfig;
use crate::draw::emit::Emitter;
use crate::draw::{DrawingTaskHeap, Engine};
use crate::error::{LayoutError, Result};
use crate::factory::{build_tree, NodeFactory, TagFactory};
use crate::font::{FixedRatioMetrics, FontRegistry};
use crate::format::{format_node, FormatContext};
use crate::model::{FontEntry, Metadata, Source};
use crate::tree::{NodeId, NodeKind, NodeTree, TreeDefaults};
use crate::units::PdfUnitConverter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Fresh,
    Formatted,
    Drawn,
}

#[derive(Debug)]
pub struct Document {
    tree: NodeTree,
    root: NodeId,
    pristine: NodeTree,
    config: LayoutConfig,
    metadata: Metadata,
    units: PdfUnitConverter,
    fonts: FontRegistry,
    state: State,
}

impl Document {
    /// Wrap an already built tree rooted at `root`.
    pub fn new(tree: NodeTree, root: NodeId, config: LayoutConfig) -> Self {
        let units = PdfUnitConverter {
            dpi: config.dpi,
            em_size: config.font_size,
        };
        let fonts = FontRegistry::new(FixedRatioMetrics::new(config.fallback_char_ratio));
        Self {
            pristine: tree.clone(),
            tree,
            root,
            config,
            metadata: Metadata::default(),
            units,
            fonts,
            state: State::Fresh,
        }
    }

    pub fn from_source(source: Source) -> Result<Self> {
        Self::from_source_with(source, &TagFactory::default())
    }

    pub fn from_source_with(source: Source, factory: &dyn NodeFactory) -> Result<Self> {
        let mut tree = NodeTree::with_defaults(TreeDefaults {
            font_size: source.config.font_size,
            line_height_factor: source.config.line_height_factor,
        });
        let root = build_tree(&mut tree, factory, &source.children)?;
        log::debug!("Built {} nodes from {} top-level elements", tree.len(), source.children.len());

        let mut document = Self::new(tree, root, source.config);
        document.metadata = source.metadata;
        for font in &source.fonts {
            document.register_font(font)?;
        }
        Ok(document)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_source(Source::from_json(json)?)
    }

    fn register_font(&mut self, font: &FontEntry) -> Result<()> {
        use base64::Engine as _;
        let payload = match font.src.split_once(',') {
            Some((_, data)) if font.src.starts_with("data:") => data,
            _ => font.src.as_str(),
        };
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| LayoutError::Font(format!("font '{}' is not valid base64: {}", font.name, e)))?;
        self.fonts.register_font_data(font.name.as_str(), &data)
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Run the formatter chains over the whole tree. Formatting an already
    /// formatted document does nothing. On failure the tree is restored to
    /// its unformatted state, so a retry fails the same way.
    pub fn format(&mut self) -> Result<()> {
        if self.state != State::Fresh {
            log::debug!("Document already formatted");
            return Ok(());
        }
        let mut ctx = FormatContext {
            tree: &mut self.tree,
            config: &self.config,
            units: &self.units,
            fonts: &self.fonts,
        };
        if let Err(err) = format_node(&mut ctx, self.root) {
            log::warn!("Formatting failed, discarding partial layout: {}", err);
            self.tree = self.pristine.clone();
            return Err(err);
        }
        self.state = State::Formatted;
        log::debug!("Formatted into {} pages", self.pages().len());
        Ok(())
    }

    /// Physical pages in output order. A dynamic page contributes the
    /// pages it was broken into.
    pub fn pages(&self) -> Vec<NodeId> {
        let mut pages = Vec::new();
        for &child in self.tree.children(self.root) {
            match &self.tree[child].kind {
                NodeKind::DynamicPage { pages: generated } if !generated.is_empty() => {
                    pages.extend_from_slice(generated)
                }
                _ => pages.push(child),
            }
        }
        pages
    }

    /// Format if needed, then draw every page into `engine`. Returns the
    /// number of drawing tasks run.
    pub fn draw(&mut self, engine: &mut dyn Engine) -> Result<usize> {
        if self.state == State::Drawn {
            return Err(LayoutError::AlreadyDrawn);
        }
        self.format()?;
        self.state = State::Drawn;

        let pages = self.pages();
        for (index, &page) in pages.iter().enumerate() {
            let boundary = self.tree.boundary(page);
            engine
                .create_page(boundary.width(), boundary.height())
                .map_err(|source| LayoutError::PageSetup { page: index, source })?;
        }

        let mut heap = DrawingTaskHeap::new();
        Emitter::new(&self.tree, &self.config, &pages).emit_all(&mut heap);
        log::debug!("Drawing {} tasks on {} pages", heap.len(), pages.len());
        heap.drain(engine)
    }

    /// Restore the tree to its state before formatting.
    pub fn initialize(&mut self) {
        self.tree = self.pristine.clone();
        self.state = State::Fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::recording::RecordingEngine;
    use crate::model::Element;

    fn source(children: Vec<Element>) -> Source {
        let mut source = Source {
            children,
            ..Source::default()
        };
        source.config.page_size = crate::config::PageSize::Custom {
            width: 200.0,
            height: 100.0,
        };
        source
    }

    #[test]
    fn test_draw_twice_requires_initialize() {
        let mut document = Document::from_source(source(vec![Element::new("page")])).unwrap();
        let mut engine = RecordingEngine::new();

        document.draw(&mut engine).unwrap();
        assert_eq!(document.state(), State::Drawn);
        assert!(matches!(document.draw(&mut engine), Err(LayoutError::AlreadyDrawn)));

        document.initialize();
        assert_eq!(document.state(), State::Fresh);
        document.draw(&mut RecordingEngine::new()).unwrap();
    }

    #[test]
    fn test_initialize_restores_the_unformatted_tree() {
        let content = Element::new("div").attr("height", 250.0);
        let mut document = Document::from_source(source(vec![Element::new("dynamic-page").child(content)])).unwrap();

        document.format().unwrap();
        assert_eq!(document.pages().len(), 3);

        document.initialize();
        assert_eq!(document.pages().len(), 1);
        document.format().unwrap();
        assert_eq!(document.pages().len(), 3);
    }

    #[test]
    fn test_failed_format_leaves_no_partial_layout() {
        let page = Element::new("dynamic-page")
            .child(Element::new("div").attr("height", 20.0))
            .child(Element::new("div").attr("height", 200.0).attr("breakable", false));
        let mut document = Document::from_source(source(vec![page])).unwrap();
        let dynamic = document.tree().children(document.root())[0];

        for _ in 0..2 {
            assert!(matches!(document.format(), Err(LayoutError::Constraint { .. })));
            assert_eq!(document.state(), State::Fresh);
            assert_eq!(document.tree().children(dynamic).len(), 2);
        }
        let mut engine = RecordingEngine::new();
        assert!(matches!(document.draw(&mut engine), Err(LayoutError::Constraint { .. })));
        assert!(engine.pages().is_empty());
    }

    #[test]
    fn test_pages_are_created_in_order() {
        let mut document =
            Document::from_source(source(vec![Element::new("page"), Element::new("page").attr("page-size", "50:60")]))
                .unwrap();
        let mut engine = RecordingEngine::new();
        document.draw(&mut engine).unwrap();

        let sizes: Vec<(f64, f64)> = engine.pages().iter().map(|p| (p.width, p.height)).collect();
        assert_eq!(sizes, vec![(200.0, 100.0), (50.0, 60.0)]);
    }

    #[test]
    fn test_bad_font_source() {
        let mut source = source(vec![]);
        source.fonts.push(FontEntry {
            name: "Broken".to_string(),
            src: "data:font/ttf;base64,@@@".to_string(),
        });
        assert!(matches!(Document::from_source(source), Err(LayoutError::Font(_))));
    }
}
