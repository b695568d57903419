//! Task emission: what each formatted node paints.
//!
//! | Layer         | Paint                                   |
//! |---------------|-----------------------------------------|
//! | `Background1` | `background-color` fill                 |
//! | `Background2` | border lines                            |
//! | `Foreground1` | text parts, images, list labels         |
//! | `Foreground3` | bookmarks, links and notes              |

use log::warn;

use crate::attribute::{self, AttributeValue};
use crate::config::LayoutConfig;
use crate::format::list::{enumeration_label, list_type};
use crate::style::Color;
use crate::tree::{Behaviour, NodeId, NodeKind, NodeTree};

use super::{DrawCommand, DrawingTask, DrawingTaskHeap, Layer};

pub struct Emitter<'a> {
    tree: &'a NodeTree,
    config: &'a LayoutConfig,
    pages: &'a [NodeId],
}

impl<'a> Emitter<'a> {
    /// `pages` are the physical pages in output order; a task's page is the
    /// index of the page its node sits on.
    pub fn new(tree: &'a NodeTree, config: &'a LayoutConfig, pages: &'a [NodeId]) -> Self {
        Self { tree, config, pages }
    }

    /// Queue the tasks of every node on every page.
    pub fn emit_all(&self, heap: &mut DrawingTaskHeap) {
        for (index, &page) in self.pages.iter().enumerate() {
            for node in self.tree.descendants(page) {
                heap.extend(self.node_tasks(node, index));
            }
        }
    }

    pub fn node_tasks(&self, id: NodeId, page: usize) -> Vec<DrawingTask> {
        let tree = self.tree;
        let data = &tree[id];
        if data.boundary.is_empty() {
            return Vec::new();
        }
        let priority = data.priority();
        let mut tasks = Vec::new();

        if let Some(color) = self.color(tree.attribute(id, attribute::BACKGROUND_COLOR)) {
            tasks.push(DrawingTask::new(
                Layer::Background1.priority(priority),
                page,
                vec![
                    DrawCommand::SetFillColor(color),
                    DrawCommand::Polygon {
                        points: data.boundary.points().to_vec(),
                        filled: true,
                    },
                ],
            ));
        }

        let border_color = self.color(tree.attribute(id, attribute::BORDER_COLOR));
        let border_width = tree.number(id, attribute::BORDER_WIDTH).unwrap_or(0.0);
        if border_width > 0.0 || border_color.is_some() {
            let mut commands = vec![
                DrawCommand::SetLineColor(border_color.unwrap_or(Color::BLACK)),
                DrawCommand::SetLineWidth(if border_width > 0.0 { border_width } else { 1.0 }),
            ];
            commands.extend(data.boundary.points().windows(2).map(|pair| DrawCommand::Line {
                from: pair[0],
                to: pair[1],
            }));
            tasks.push(DrawingTask::new(Layer::Background2.priority(priority), page, commands));
        }

        let content = match &data.kind {
            NodeKind::Text { parts, .. } if !parts.is_empty() => {
                let font = tree.keyword(id, attribute::FONT_TYPE).map(str::to_string);
                let font_size = tree.font_size(id);
                let mut commands = vec![DrawCommand::SetFillColor(self.text_color(id))];
                commands.extend(parts.iter().map(|part| DrawCommand::Text {
                    text: part.text.clone(),
                    origin: (part.x, part.top - font_size).into(),
                    font: font.clone(),
                    font_size,
                    word_spacing: part.word_spacing,
                }));
                Some(commands)
            }
            NodeKind::Image => match tree.attribute(id, attribute::SRC).and_then(AttributeValue::as_str) {
                Some(src) => Some(vec![DrawCommand::Image {
                    src: src.to_string(),
                    first: tree.first_point(id),
                    diagonal: tree.diagonal_point(id),
                }]),
                None => {
                    warn!("Image {} has no src; nothing drawn", id);
                    None
                }
            },
            NodeKind::List { enumeration_width } => Some(self.list_labels(id, *enumeration_width)),
            _ => None,
        };
        if let Some(commands) = content {
            tasks.push(DrawingTask::new(Layer::Foreground1.priority(priority), page, commands));
        }

        let annotations: Vec<DrawCommand> = data.behaviours.iter().filter_map(|b| self.behaviour(id, b)).collect();
        if !annotations.is_empty() {
            tasks.push(DrawingTask::new(Layer::Foreground3.priority(priority), page, annotations));
        }

        let angle = tree.number(id, attribute::ROTATE).unwrap_or(0.0);
        match data.boundary.middle_point() {
            Some(origin) if angle != 0.0 => tasks.into_iter().map(|t| t.rotated(origin, angle)).collect(),
            _ => tasks,
        }
    }

    /// One label per item, on the item's first line, ending where the
    /// item's content starts.
    fn list_labels(&self, list: NodeId, width: f64) -> Vec<DrawCommand> {
        let tree = self.tree;
        let kind = list_type(tree, list, self.config.list_type);
        let font = tree.keyword(list, attribute::FONT_TYPE).map(str::to_string);
        let font_size = tree.font_size(list);
        let mut commands = vec![DrawCommand::SetFillColor(self.text_color(list))];
        for (index, &item) in tree.children(list).iter().enumerate() {
            let label = enumeration_label(kind, index);
            if label.is_empty() || tree.boundary(item).is_empty() {
                continue;
            }
            let first = tree.first_point(item);
            commands.push(DrawCommand::Text {
                text: label,
                origin: first.translate(-width, -font_size),
                font: font.clone(),
                font_size,
                word_spacing: 0.0,
            });
        }
        commands
    }

    fn behaviour(&self, id: NodeId, behaviour: &Behaviour) -> Option<DrawCommand> {
        let tree = self.tree;
        let (first, diagonal) = (tree.first_point(id), tree.diagonal_point(id));
        Some(match behaviour {
            Behaviour::Bookmark { title } => DrawCommand::Bookmark {
                title: title.clone(),
                top: first.y,
            },
            Behaviour::GoToUri { uri } => DrawCommand::UriLink {
                uri: uri.clone(),
                first,
                diagonal,
            },
            Behaviour::GoToInternal { target } => {
                let found = self
                    .pages
                    .iter()
                    .enumerate()
                    .find_map(|(index, &page)| tree.find_by_id(page, target).map(|node| (index, node)));
                let Some((page, node)) = found else {
                    warn!("Link target {:?} of node {} not found; link dropped", target, id);
                    return None;
                };
                DrawCommand::InternalLink {
                    first,
                    diagonal,
                    page,
                    top: tree.first_point(node).y,
                }
            }
            Behaviour::StickyNote { text } => DrawCommand::StickyNote {
                text: text.clone(),
                first,
                diagonal,
            },
        })
    }

    fn text_color(&self, id: NodeId) -> Color {
        self.color(self.tree.recursive_attribute(id, attribute::COLOR))
            .unwrap_or(Color::BLACK)
    }

    fn color(&self, value: Option<&AttributeValue>) -> Option<Color> {
        let raw = value?.as_str()?;
        let color = Color::hex(&self.config.color(raw));
        if color.is_none() {
            warn!("Unrecognized color {:?}; ignored", raw);
        }
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::testing::Fixture;
    use crate::geometry::Point;
    use crate::tree::LinePart;

    fn only_task(tasks: Vec<DrawingTask>) -> DrawingTask {
        assert_eq!(tasks.len(), 1);
        tasks.into_iter().next().unwrap()
    }

    #[test]
    fn test_unformatted_node_paints_nothing() {
        let mut fx = Fixture::new();
        let id = fx.tree.create(NodeKind::Container);
        fx.tree.set_attribute(id, attribute::BACKGROUND_COLOR, "#ff0000");
        let pages = [id];
        assert!(Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(id, 0).is_empty());
    }

    #[test]
    fn test_background_and_border() {
        let mut fx = Fixture::new();
        let id = fx.placed(NodeKind::Container, 0.0, 100.0, 50.0, 50.0);
        fx.tree.set_attribute(id, attribute::BACKGROUND_COLOR, "red");
        fx.tree.set_attribute(id, attribute::BORDER_WIDTH, 2.0);
        let pages = [id];

        let tasks = Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(id, 0);

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, Layer::Background1.priority(0));
        assert_eq!(tasks[0].commands[0], DrawCommand::SetFillColor(Color::rgb(1.0, 0.0, 0.0)));
        // Four edges of the closed rectangle.
        assert_eq!(tasks[1].commands.len(), 2 + 4);
        assert_eq!(tasks[1].commands[1], DrawCommand::SetLineWidth(2.0));
    }

    #[test]
    fn test_text_parts_are_drawn_on_their_baseline() {
        let mut fx = Fixture::new();
        let id = fx.placed(NodeKind::text("hello world"), 10.0, 100.0, 60.0, 12.0);
        fx.tree.set_attribute(id, attribute::FONT_SIZE, 10.0);
        if let NodeKind::Text { parts, .. } = &mut fx.tree[id].kind {
            parts.push(LinePart {
                line: 0,
                text: "hello world".to_string(),
                x: 10.0,
                top: 100.0,
                width: 55.0,
                height: 12.0,
                word_spacing: 0.0,
            });
        }
        let pages = [id];

        let task = only_task(Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(id, 0));

        assert_eq!(task.priority, Layer::Foreground1.priority(0));
        assert!(matches!(
            &task.commands[1],
            DrawCommand::Text { origin, font_size, .. } if *origin == Point::new(10.0, 90.0) && *font_size == 10.0
        ));
    }

    #[test]
    fn test_internal_link_resolves_target_page() {
        let mut fx = Fixture::new();
        let first = fx.placed(NodeKind::Page, 0.0, 100.0, 100.0, 100.0);
        let second = fx.placed(NodeKind::Page, 0.0, 100.0, 100.0, 100.0);
        let link = fx.placed(NodeKind::Container, 0.0, 100.0, 100.0, 10.0);
        let target = fx.placed(NodeKind::Container, 0.0, 60.0, 100.0, 10.0);
        fx.child(first, link);
        fx.child(second, target);
        fx.tree.set_attribute(target, "id", "chapter-2");
        fx.tree.add_behaviour(
            link,
            Behaviour::GoToInternal {
                target: "chapter-2".to_string(),
            },
        );
        let pages = [first, second];

        let task = only_task(Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(link, 0));

        assert_eq!(task.priority, Layer::Foreground3.priority(-1));
        assert!(matches!(task.commands[0], DrawCommand::InternalLink { page: 1, top, .. } if top == 60.0));
    }

    #[test]
    fn test_rotation_wraps_every_task() {
        let mut fx = Fixture::new();
        let id = fx.placed(NodeKind::Container, 0.0, 100.0, 50.0, 50.0);
        fx.tree.set_attribute(id, attribute::BACKGROUND_COLOR, "#000");
        fx.tree.set_attribute(id, attribute::ROTATE, 0.5);
        let pages = [id];

        let task = only_task(Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(id, 0));

        assert_eq!(
            task.commands[1],
            DrawCommand::Rotate {
                origin: Point::new(25.0, 75.0),
                angle: 0.5
            }
        );
    }

    #[test]
    fn test_list_labels_hang_left_of_items() {
        let mut fx = Fixture::new();
        let list = fx.placed(NodeKind::List { enumeration_width: 15.0 }, 0.0, 100.0, 100.0, 40.0);
        fx.tree.set_attribute(list, attribute::LIST_TYPE, "decimal");
        fx.tree.set_attribute(list, attribute::FONT_SIZE, 10.0);
        for y in [100.0, 80.0] {
            let item = fx.placed(NodeKind::Container, 20.0, y, 80.0, 20.0);
            fx.child(list, item);
        }
        let pages = [list];

        let task = only_task(Emitter::new(&fx.tree, &fx.config, &pages).node_tasks(list, 0));

        let labels: Vec<(&str, Point)> = task
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, origin, .. } => Some((text.as_str(), *origin)),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec![("1.", Point::new(5.0, 90.0)), ("2.", Point::new(5.0, 70.0))]);
    }
}
