// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui view for a [`NodeEditor`].
//!
//! The view owns no graph state. It draws the editor and turns pointer
//! input into editor calls:
//! - Background drag (primary or middle) pans through the pan session
//! - Scroll wheel zooms one step per event
//! - Right-click on the background opens a menu to add a node
//! - Dragging a node's output handle runs a connection gesture
//! - Dragging a node body moves it
//! - Delete removes the hovered node

use crate::connection::Connection;
use crate::graph::NodeEditor;
use crate::node::{EditorNode, Highlight, NodeId};
use crate::viewport::{Point, Size};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// Node visual dimensions (canvas units)
const NODE_WIDTH: f32 = 180.0;
const NODE_HEADER_HEIGHT: f32 = 24.0;
const FIELD_HEIGHT: f32 = 20.0;
const HANDLE_RADIUS: f32 = 6.0;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;

/// Connection visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const CONNECTION_THICKNESS: f32 = 2.5;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

/// What the pointer is currently doing
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    /// Nothing in progress
    #[default]
    Normal,
    /// Panning the view
    Panning,
    /// Moving a node
    DraggingNode {
        /// Node being moved
        node: NodeId,
        /// Pointer offset from the node origin (canvas space)
        grab_offset: Point,
    },
    /// Dragging a new connection out of a node
    Connecting {
        /// Source node
        from: NodeId,
        /// Current pointer position (screen space)
        current_pos: Pos2,
    },
}

/// egui view state for a node editor
#[derive(Debug, Clone)]
pub struct GraphEditorView {
    /// Current interaction
    pub mode: InteractionMode,
    /// Draw the background grid
    pub show_grid: bool,
    last_mouse_pos: Pos2,
    hovered_node: Option<NodeId>,
    menu_position: Option<Pos2>,
}

impl GraphEditorView {
    /// Create a new view
    pub fn new() -> Self {
        Self {
            mode: InteractionMode::Normal,
            show_grid: true,
            last_mouse_pos: Pos2::ZERO,
            hovered_node: None,
            menu_position: None,
        }
    }

    /// Node currently under the pointer
    pub fn hovered_node(&self) -> Option<&NodeId> {
        self.hovered_node.as_ref()
    }

    /// Draw the editor and handle input
    pub fn ui(&mut self, ui: &mut egui::Ui, editor: &mut NodeEditor) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.show_grid {
            self.draw_grid(&painter, rect, editor);
        }

        self.handle_input(ui, &response, rect, editor);

        self.draw_connections(&painter, rect, editor);
        if let InteractionMode::Connecting { ref from, current_pos } = self.mode {
            if let Some(node) = editor.node(from) {
                let start = output_handle(screen_rect(editor, rect, node));
                draw_bezier(&painter, start, current_pos, Color32::LIGHT_GRAY, zoom_of(editor));
            }
        }
        self.draw_nodes(&painter, rect, editor);
        draw_status_bar(&painter, rect, editor);

        self.context_menu(&response, rect, editor);
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        editor: &mut NodeEditor,
    ) {
        let mouse_pos = ui.input(|i| i.pointer.hover_pos()).unwrap_or(self.last_mouse_pos);
        self.last_mouse_pos = mouse_pos;

        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 && rect.contains(mouse_pos) {
            // egui reports scrolling down as negative
            editor.zoom(-f64::from(scroll));
        }

        let canvas_pos = to_canvas(editor, rect, mouse_pos);
        self.hovered_node = find_node_at(editor, rect, mouse_pos);

        self.mode = match std::mem::take(&mut self.mode) {
            InteractionMode::Normal => self.start_interaction(ui, response, rect, editor, mouse_pos),

            InteractionMode::Panning => {
                if response.dragged() && !response.drag_stopped() {
                    editor.drag_pan(point(mouse_pos));
                    InteractionMode::Panning
                } else {
                    editor.end_pan();
                    InteractionMode::Normal
                }
            }

            InteractionMode::DraggingNode { node, grab_offset } => {
                if response.dragged() && !response.drag_stopped() {
                    let position =
                        Point::new(canvas_pos.x - grab_offset.x, canvas_pos.y - grab_offset.y);
                    editor.set_node_position(&node, position);
                    InteractionMode::DraggingNode { node, grab_offset }
                } else {
                    InteractionMode::Normal
                }
            }

            InteractionMode::Connecting { from, .. } => {
                if response.dragged() && !response.drag_stopped() {
                    InteractionMode::Connecting {
                        from,
                        current_pos: mouse_pos,
                    }
                } else {
                    // Released anywhere, including off every node: always finish
                    let target = self.hovered_node.clone().filter(|id| *id != from);
                    editor.finish_connection(&from, target.as_ref());
                    InteractionMode::Normal
                }
            }
        };

        if response.secondary_clicked() && self.hovered_node.is_none() {
            self.menu_position = Some(mouse_pos);
        }

        if let Some(hovered) = self.hovered_node.clone() {
            let delete = ui.input(|i| i.key_pressed(egui::Key::Delete));
            if delete && matches!(self.mode, InteractionMode::Normal) {
                editor.remove_node_by_id(&hovered);
                self.hovered_node = None;
            }
        }
    }

    fn start_interaction(
        &self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        editor: &mut NodeEditor,
        mouse_pos: Pos2,
    ) -> InteractionMode {
        let press_pos = ui.input(|i| i.pointer.press_origin()).unwrap_or(mouse_pos);

        if response.drag_started_by(egui::PointerButton::Middle) {
            editor.begin_pan(point(press_pos));
            return InteractionMode::Panning;
        }
        if !response.drag_started_by(egui::PointerButton::Primary) {
            return InteractionMode::Normal;
        }

        if let Some(from) = find_handle_at(editor, rect, press_pos) {
            editor.start_connection(&from);
            return InteractionMode::Connecting {
                from,
                current_pos: mouse_pos,
            };
        }

        if let Some(node_id) = find_node_at(editor, rect, press_pos) {
            if let Some(node) = editor.node(&node_id) {
                let press_canvas = to_canvas(editor, rect, press_pos);
                let origin = node.position();
                return InteractionMode::DraggingNode {
                    node: node_id,
                    grab_offset: Point::new(press_canvas.x - origin.x, press_canvas.y - origin.y),
                };
            }
        }

        editor.begin_pan(point(press_pos));
        if editor.drag_pan(point(mouse_pos)) {
            InteractionMode::Panning
        } else {
            InteractionMode::Normal
        }
    }

    fn context_menu(&mut self, response: &egui::Response, rect: Rect, editor: &mut NodeEditor) {
        let Some(menu_pos) = self.menu_position else {
            return;
        };
        let menu = response.context_menu(|ui| {
            let has_types = !editor.node_types().is_empty();
            if ui.add_enabled(has_types, egui::Button::new("Add node")).clicked() {
                // The placement formula ignores pan, so subtract it here
                let pan = editor.viewport().position;
                let local = menu_pos - rect.min;
                let menu_position = Point::new(f64::from(local.x) - pan.x, f64::from(local.y) - pan.y);
                editor.add_node_from_menu(menu_position, size_of(rect));
                ui.close_menu();
            }
            if ui.button("Reset view").clicked() {
                editor.reset_position();
                ui.close_menu();
            }
        });
        if menu.is_none() {
            self.menu_position = None;
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect, editor: &NodeEditor) {
        let zoom = zoom_of(editor);
        let spacing = GRID_SPACING * zoom;
        let origin = to_screen(editor, rect, Point::ZERO);
        let grid_color = Color32::from_rgba_unmultiplied(60, 60, 60, 100);

        let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(spacing);
        while x < rect.right() {
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(1.0, grid_color),
            );
            x += spacing;
        }

        let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(spacing);
        while y < rect.bottom() {
            painter.line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(1.0, grid_color),
            );
            y += spacing;
        }
    }

    fn draw_connections(&self, painter: &egui::Painter, rect: Rect, editor: &NodeEditor) {
        let zoom = zoom_of(editor);
        for node in editor.nodes() {
            let start = output_handle(screen_rect(editor, rect, node));
            for Connection { to } in node.connections() {
                if let Some(target) = editor.node(to) {
                    let end = input_handle(screen_rect(editor, rect, target));
                    draw_bezier(painter, start, end, Color32::from_rgb(120, 170, 220), zoom);
                }
            }
        }
    }

    fn draw_nodes(&self, painter: &egui::Painter, rect: Rect, editor: &NodeEditor) {
        let zoom = zoom_of(editor);
        for node in editor.nodes() {
            let node_rect = screen_rect(editor, rect, node);
            if !node_rect.intersects(rect) {
                continue;
            }
            let is_hovered = self.hovered_node.as_ref() == Some(node.id());

            painter.rect_filled(
                node_rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
                NODE_ROUNDING * zoom,
                Color32::from_rgba_unmultiplied(0, 0, 0, 60),
            );

            let bg_color = if is_hovered {
                Color32::from_rgb(55, 55, 60)
            } else {
                Color32::from_rgb(45, 45, 48)
            };
            painter.rect_filled(node_rect, NODE_ROUNDING * zoom, bg_color);

            let header_rect = Rect::from_min_size(
                node_rect.min,
                Vec2::new(node_rect.width(), NODE_HEADER_HEIGHT * zoom),
            );
            painter.rect_filled(
                header_rect,
                egui::Rounding {
                    nw: NODE_ROUNDING * zoom,
                    ne: NODE_ROUNDING * zoom,
                    sw: 0.0,
                    se: 0.0,
                },
                Color32::from_rgb(70, 100, 130),
            );
            painter.text(
                header_rect.center(),
                egui::Align2::CENTER_CENTER,
                node.name(),
                egui::FontId::proportional(12.0 * zoom),
                Color32::WHITE,
            );

            if let Some(node_type) = editor.node_type(node.node_type()) {
                let shown = node_type.fields.iter().filter(|f| f.shown);
                for (row, field) in shown.enumerate() {
                    let y = NODE_HEADER_HEIGHT + (row as f32 + 0.5) * FIELD_HEIGHT;
                    let value = node.value(&field.id).unwrap_or(&field.default);
                    painter.text(
                        Pos2::new(node_rect.left() + 8.0 * zoom, node_rect.top() + y * zoom),
                        egui::Align2::LEFT_CENTER,
                        format!("{}: {}", field.name, value),
                        egui::FontId::proportional(10.0 * zoom),
                        Color32::from_gray(200),
                    );
                }
            }

            let outline = match node.highlight() {
                Highlight::Source => Some(Color32::from_rgb(255, 170, 60)),
                Highlight::TargetCandidate => Some(Color32::from_rgb(100, 220, 120)),
                Highlight::Idle => None,
            };
            if let Some(color) = outline {
                painter.rect_stroke(node_rect, NODE_ROUNDING * zoom, Stroke::new(2.0, color));
            }

            let radius = HANDLE_RADIUS * zoom;
            painter.circle_filled(input_handle(node_rect), radius, Color32::from_gray(160));
            painter.circle_filled(output_handle(node_rect), radius, Color32::from_rgb(120, 170, 220));
            painter.circle_stroke(output_handle(node_rect), radius, Stroke::new(1.0, Color32::from_gray(30)));
        }
    }
}

impl Default for GraphEditorView {
    fn default() -> Self {
        Self::new()
    }
}

fn point(pos: Pos2) -> Point {
    Point::new(f64::from(pos.x), f64::from(pos.y))
}

fn size_of(rect: Rect) -> Size {
    Size::new(f64::from(rect.width()), f64::from(rect.height()))
}

fn zoom_of(editor: &NodeEditor) -> f32 {
    editor.viewport().zoom as f32
}

fn to_screen(editor: &NodeEditor, rect: Rect, canvas: Point) -> Pos2 {
    let local = editor.viewport().canvas_to_screen(canvas, size_of(rect));
    rect.min + Vec2::new(local.x as f32, local.y as f32)
}

fn to_canvas(editor: &NodeEditor, rect: Rect, screen: Pos2) -> Point {
    editor.viewport().screen_to_canvas(point(screen - rect.min.to_vec2()), size_of(rect))
}

fn node_height(editor: &NodeEditor, node: &EditorNode) -> f32 {
    let rows = editor
        .node_type(node.node_type())
        .map_or(0, |t| t.fields.iter().filter(|f| f.shown).count());
    NODE_HEADER_HEIGHT + rows as f32 * FIELD_HEIGHT + 8.0
}

fn screen_rect(editor: &NodeEditor, rect: Rect, node: &EditorNode) -> Rect {
    let zoom = zoom_of(editor);
    Rect::from_min_size(
        to_screen(editor, rect, node.position()),
        Vec2::new(NODE_WIDTH, node_height(editor, node)) * zoom,
    )
}

fn input_handle(node_rect: Rect) -> Pos2 {
    Pos2::new(node_rect.left(), node_rect.top() + node_rect.height().min(NODE_HEADER_HEIGHT) / 2.0)
}

fn output_handle(node_rect: Rect) -> Pos2 {
    Pos2::new(node_rect.right(), node_rect.top() + node_rect.height().min(NODE_HEADER_HEIGHT) / 2.0)
}

// Topmost (last drawn) node under the pointer
fn find_node_at(editor: &NodeEditor, rect: Rect, screen: Pos2) -> Option<NodeId> {
    let nodes: Vec<_> = editor.nodes().collect();
    nodes
        .into_iter()
        .rev()
        .find(|n| screen_rect(editor, rect, n).contains(screen))
        .map(|n| n.id().clone())
}

fn find_handle_at(editor: &NodeEditor, rect: Rect, screen: Pos2) -> Option<NodeId> {
    let radius = HANDLE_RADIUS * zoom_of(editor) * 1.5;
    let nodes: Vec<_> = editor.nodes().collect();
    nodes
        .into_iter()
        .rev()
        .find(|n| output_handle(screen_rect(editor, rect, n)).distance(screen) < radius)
        .map(|n| n.id().clone())
}

fn draw_bezier(painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32, zoom: f32) {
    let distance = (to.x - from.x).abs();
    let curvature = (BEZIER_CURVATURE * zoom).min(distance * 0.5).max(10.0 * zoom);

    let ctrl1 = Pos2::new(from.x + curvature, from.y);
    let ctrl2 = Pos2::new(to.x - curvature, to.y);

    let points = bezier_points(from, ctrl1, ctrl2, to, 32);
    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], Stroke::new(CONNECTION_THICKNESS * zoom, color));
    }
}

fn draw_status_bar(painter: &egui::Painter, rect: Rect, editor: &NodeEditor) {
    painter.text(
        Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0),
        egui::Align2::LEFT_CENTER,
        format!(
            "Nodes: {} | Connections: {} | Zoom: {:.0}%",
            editor.node_count(),
            editor.connection_count(),
            editor.viewport().zoom * 100.0,
        ),
        egui::FontId::proportional(11.0),
        Color32::from_gray(150),
    );
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let mt = 1.0 - t;

        let x = mt * mt * mt * p0.x + 3.0 * mt * mt * t * p1.x + 3.0 * mt * t * t * p2.x + t * t * t * p3.x;
        let y = mt * mt * mt * p0.y + 3.0 * mt * mt * t * p1.y + 3.0 * mt * t * t * p2.y + t * t * t * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn test_bezier_endpoints() {
        let from = Pos2::new(0.0, 0.0);
        let to = Pos2::new(100.0, 50.0);
        let points = bezier_points(from, Pos2::new(50.0, 0.0), Pos2::new(50.0, 50.0), to, 8);
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], from);
        assert_eq!(points[8], to);
    }

    #[test]
    fn test_hit_testing_follows_viewport() {
        let mut editor = NodeEditor::default();
        editor.add_node_type(NodeType::new("Box")).unwrap();
        let id = editor.create_node("Box", Point::new(0.0, 0.0)).unwrap();
        let rect = Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(400.0, 300.0));

        // Node origin sits at the center of the editor area
        let inside = rect.center() + Vec2::new(5.0, 5.0);
        assert_eq!(find_node_at(&editor, rect, inside), Some(id.clone()));
        assert_eq!(find_node_at(&editor, rect, rect.min), None);

        editor.begin_pan(Point::ZERO);
        editor.drag_pan(Point::new(-300.0, 0.0));
        editor.end_pan();
        assert_eq!(find_node_at(&editor, rect, inside), None);

        let handle = output_handle(screen_rect(&editor, rect, editor.node(&id).unwrap()));
        assert_eq!(find_handle_at(&editor, rect, handle), Some(id));
    }
}
