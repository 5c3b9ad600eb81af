//! Block layout: the box frame shared by every renderer, vertical stacking
//! of children with floats and clearance, area breaks, and images.

use crate::error::{Diagnostic, LayoutError};
use crate::geometry::{LayoutArea, Rectangle};
use crate::layout::floats::{available_band, clearance, floats_bottom, place_float, FloatBox};
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, LayoutStatus, NodeId, RendererKind, UNBOUNDED};
use crate::style::{Float, Overflow, ResolvedStyle};

/// Geometry of a box opened in an area, before its content is laid out.
#[derive(Debug, Clone)]
pub(crate) struct BoxFrame {
    pub style: ResolvedStyle,
    pub border_width: f64,
    /// Border-box height fixed by style or by the parent.
    pub fixed_height: Option<f64>,
    /// Content box. Its height is what the content may use in this area.
    pub content: Rectangle,
    pub clip: Option<Rectangle>,
}

/// How a run of stacked children ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StackEnd {
    Complete,
    /// Children before `index` are placed, plus `split` (the placed piece of
    /// child `index`). The rest starts with `overflow`, or with child
    /// `index` itself when it was not cut.
    Break {
        index: usize,
        split: Option<NodeId>,
        overflow: Option<NodeId>,
    },
    Nothing {
        cause: NodeId,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct StackOutcome {
    /// Lowest edge of placed content, floats included.
    pub bottom: f64,
    pub end: StackEnd,
}

impl LayoutEngine {
    /// Resolve the box's own size and check it against the area.
    ///
    /// Returns `None` when the box does not fit and may not overflow.
    pub(crate) fn open_box(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<Option<BoxFrame>, LayoutError> {
        let bbox = ctx.area.bbox;
        let definite_area_height = (bbox.height < UNBOUNDED).then_some(bbox.height);
        let style = self.resolve_style(id, bbox.width, definite_area_height)?;
        let margin = style.margin;
        let bp = style.border_padding();
        let eps = self.config.epsilon;

        let border_width = ctx
            .definite_width
            .or(style.width.fixed())
            .map(|w| style.clamp_width(w))
            .unwrap_or_else(|| style.clamp_width(bbox.width - margin.horizontal()))
            .max(bp.horizontal());
        let fixed_height = ctx
            .definite_height
            .or(style.height.fixed())
            .map(|h| style.clamp_height(h).max(bp.vertical()));

        let overflows_x = margin.horizontal() + border_width > bbox.width + eps;
        let overflows_y = fixed_height.is_some_and(|h| margin.vertical() + h > bbox.height + eps);
        let mut clip = None;
        for (overflows, mode) in [(overflows_x, style.overflow_x), (overflows_y, style.overflow_y)] {
            if !overflows {
                continue;
            }
            match mode {
                Overflow::Fit if !ctx.forced_placement => return Ok(None),
                Overflow::Fit => {
                    self.diagnose(Diagnostic::ForcedPlacement {
                        node: id,
                        area_index: ctx.area.area_index,
                    });
                    clip = Some(bbox);
                }
                Overflow::Hidden => clip = Some(bbox),
                Overflow::Visible => {}
            }
        }

        let content_height = match fixed_height {
            Some(h) if style.overflow_y == Overflow::Fit => h - bp.vertical(),
            Some(_) => UNBOUNDED,
            None => (bbox.height - margin.vertical() - bp.vertical())
                .min(style.max_height - bp.vertical())
                .max(0.0),
        };
        let content = Rectangle::new(
            bbox.x + margin.left + bp.left,
            bbox.y + margin.top + bp.top,
            (border_width - bp.horizontal()).max(0.0),
            content_height,
        );

        self.tree.get_mut(id)?.resolved = Some(style.clone());
        Ok(Some(BoxFrame {
            style,
            border_width,
            fixed_height,
            content,
            clip,
        }))
    }

    /// Size the box around `content_height` of content and record where it
    /// landed. Returns `None` when a rotated box turns out not to fit.
    pub(crate) fn close_box(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        content_height: f64,
        partial: bool,
    ) -> Result<Option<LayoutArea>, LayoutError> {
        let bbox = ctx.area.bbox;
        let style = &frame.style;
        let margin = style.margin;
        let bp = style.border_padding();
        let eps = self.config.epsilon;
        let top = bbox.y + margin.top;

        let mut height = match frame.fixed_height {
            Some(h) => h,
            None => style.clamp_height(content_height + bp.vertical()),
        };
        if partial && frame.fixed_height.is_none() {
            // A box continued in the next area runs to the end of this one.
            height = height.max(bbox.bottom() - margin.bottom - top);
        }
        let border_box = Rectangle::new(bbox.x + margin.left, top, frame.border_width, height);

        let mut footprint = border_box;
        let mut clip = frame.clip;
        if style.rotation_angle != 0.0 {
            footprint = border_box.rotated_bounds(style.rotation_angle);
            let fits = footprint.width + margin.horizontal() <= bbox.width + eps
                && footprint.height + margin.vertical() <= bbox.height + eps;
            if !fits {
                match style.overflow_x {
                    Overflow::Fit if !ctx.forced_placement => return Ok(None),
                    Overflow::Fit => {
                        self.diagnose(Diagnostic::ForcedPlacement {
                            node: id,
                            area_index: ctx.area.area_index,
                        });
                        clip = Some(bbox);
                    }
                    Overflow::Hidden => clip = Some(bbox),
                    Overflow::Visible => {}
                }
            }
        }
        if style.overflow_x == Overflow::Hidden || style.overflow_y == Overflow::Hidden {
            clip = Some(match clip {
                Some(c) => c.intersection(&border_box).unwrap_or(border_box),
                None => border_box,
            });
        }

        let occupied = ctx.area.with_bbox(footprint.expand(&margin));
        let record = self.tree.get_mut(id)?;
        record.occupied_area = Some(occupied);
        record.border_box = Some(border_box);
        record.clip = clip;
        Ok(Some(occupied))
    }

    pub(crate) fn layout_block(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let children = self.tree.children(id)?.to_vec();
        let outcome = self.stack_children(ctx, &frame, &children)?;
        self.finish_stack(id, ctx, &frame, &children, outcome)
    }

    /// Place `children` top to bottom in the frame's content box.
    pub(crate) fn stack_children(
        &mut self,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
    ) -> Result<StackOutcome, LayoutError> {
        let content = frame.content;
        let limit = content.bottom();
        let mut floats: Vec<FloatBox> = ctx.floats.clone();
        let inherited_floats = floats.len();
        let mut cursor = content.y;
        let mut bottom = content.y;
        let mut placed_any = false;

        for (index, &child) in children.iter().enumerate() {
            let record = self.tree.get(child)?;
            let kind = record.kind.clone();
            let side = record.style.float.unwrap_or_default();
            let clear = record.style.clear.unwrap_or_default();

            if kind == RendererKind::AreaBreak {
                self.layout(child, &ctx.child(Rectangle::new(content.x, cursor, content.width, 0.0)))?;
                if index + 1 < children.len() {
                    return Ok(StackOutcome {
                        bottom,
                        end: StackEnd::Break {
                            index: index + 1,
                            split: None,
                            overflow: None,
                        },
                    });
                }
                continue;
            }

            if let Some(y) = clearance(&floats, clear) {
                cursor = cursor.max(y);
            }
            let forced = ctx.forced_placement && !placed_any;

            if side != Float::None {
                match self.place_float_child(child, ctx, &floats, content, cursor, forced)? {
                    Some(placed) => {
                        bottom = bottom.max(placed.rect.bottom());
                        floats.push(placed);
                        placed_any = true;
                        continue;
                    }
                    None if !placed_any => {
                        return Ok(StackOutcome {
                            bottom,
                            end: StackEnd::Nothing { cause: child },
                        })
                    }
                    None => {
                        return Ok(StackOutcome {
                            bottom,
                            end: StackEnd::Break {
                                index,
                                split: None,
                                overflow: None,
                            },
                        })
                    }
                }
            }

            // Boxes with their own formatting context sit beside floats;
            // block and paragraph content flows around them.
            let flows_around = kind.is_block_like() || kind == RendererKind::Paragraph;
            let (x, width) = if flows_around {
                (content.x, content.width)
            } else {
                let (left, right) = available_band(&floats, content.x, content.right(), cursor, cursor + 1.0);
                (left, right - left)
            };
            let mut child_ctx = ctx
                .child(Rectangle::new(x, cursor, width, (limit - cursor).max(0.0)))
                .forced(forced);
            if flows_around {
                child_ctx = child_ctx.with_floats(floats.clone());
            }

            let result = self.layout(child, &child_ctx)?;
            match result.status {
                LayoutStatus::Full => {
                    cursor = result.bottom().unwrap_or(cursor);
                    bottom = bottom.max(cursor);
                    placed_any = true;
                }
                LayoutStatus::Partial => {
                    bottom = bottom.max(result.bottom().unwrap_or(cursor));
                    return Ok(StackOutcome {
                        bottom,
                        end: StackEnd::Break {
                            index,
                            split: result.split_renderer,
                            overflow: result.overflow_renderer,
                        },
                    });
                }
                LayoutStatus::Nothing if !placed_any => {
                    return Ok(StackOutcome {
                        bottom,
                        end: StackEnd::Nothing {
                            cause: result.cause_of_nothing.unwrap_or(child),
                        },
                    })
                }
                LayoutStatus::Nothing => {
                    return Ok(StackOutcome {
                        bottom,
                        end: StackEnd::Break {
                            index,
                            split: None,
                            overflow: None,
                        },
                    })
                }
            }
        }

        if let Some(float_bottom) = floats_bottom(&floats[inherited_floats..]) {
            bottom = bottom.max(float_bottom);
        }
        Ok(StackOutcome {
            bottom,
            end: StackEnd::Complete,
        })
    }

    /// Lay a floated child out beside `floats`, at or below `top` inside
    /// `content`. `None` when it does not fit above the bottom of `content`.
    pub(crate) fn place_float_child(
        &mut self,
        child: NodeId,
        ctx: &LayoutContext,
        floats: &[FloatBox],
        content: Rectangle,
        top: f64,
        forced: bool,
    ) -> Result<Option<FloatBox>, LayoutError> {
        let side = self.tree.get(child)?.style.float.unwrap_or_default();
        let metrics = self.min_max_width(child)?;
        let width = metrics.max_width.min(content.width).max(metrics.min_width);
        let height = self.measure_height(child, width)?;
        let rect = place_float(floats, side, width, height, content.x, content.right(), top);
        if rect.bottom() > content.bottom() + self.config.epsilon && !forced {
            return Ok(None);
        }

        let area = Rectangle::new(rect.x, rect.y, width, (content.bottom() - rect.y).max(height));
        let result = self.layout(child, &ctx.child(area).forced(forced))?;
        Ok(match (result.status, result.occupied_area) {
            (LayoutStatus::Full, Some(occupied)) => Some(FloatBox {
                rect: occupied.bbox,
                side,
            }),
            _ => None,
        })
    }

    /// Turn a stacking outcome into the box's result, cutting the box in two
    /// when the stack broke.
    pub(crate) fn finish_stack(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
        outcome: StackOutcome,
    ) -> Result<LayoutResult, LayoutError> {
        let content_height = (outcome.bottom - frame.content.y).max(0.0);
        match outcome.end {
            StackEnd::Complete => self.close_full(id, ctx, frame, content_height),
            StackEnd::Nothing { cause } => {
                let cause = if frame.style.keep_together { id } else { cause };
                Ok(LayoutResult::nothing(cause))
            }
            StackEnd::Break {
                index,
                split,
                overflow,
            } => {
                let mut split_children = children[..index.min(children.len())].to_vec();
                split_children.extend(split);
                let overflow_children: Vec<NodeId> = match overflow {
                    Some(piece) => std::iter::once(piece)
                        .chain(children.iter().skip(index + 1).copied())
                        .collect(),
                    None => children.iter().skip(index).copied().collect(),
                };
                self.split_box(id, ctx, frame, content_height, split_children, overflow_children)
            }
        }
    }

    /// Close a box whose content is complete.
    pub(crate) fn close_full(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        content_height: f64,
    ) -> Result<LayoutResult, LayoutError> {
        Ok(self
            .close_box(id, ctx, frame, content_height, false)?
            .map(LayoutResult::full)
            .unwrap_or_else(|| LayoutResult::nothing(id)))
    }

    /// Close a box that continues in the next area: a copy holding
    /// `split_children` stays in this one, a copy holding
    /// `overflow_children` is handed back as the overflow renderer.
    pub(crate) fn split_box(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        content_height: f64,
        split_children: Vec<NodeId>,
        overflow_children: Vec<NodeId>,
    ) -> Result<LayoutResult, LayoutError> {
        if frame.style.keep_together && !ctx.forced_placement {
            return Ok(LayoutResult::nothing(id));
        }
        let Some(occupied) = self.close_box(id, ctx, frame, content_height, true)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let split_id = self.tree.clone_with_children(id, split_children)?;
        let overflow_id = self.tree.clone_with_children(id, overflow_children)?;
        self.tree.get_mut(overflow_id)?.reset_placement();
        Ok(LayoutResult::partial(occupied, split_id, overflow_id))
    }

    pub(crate) fn layout_image(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let (width, height) = self.image_border_size(id, ctx.area.bbox.width)?;
        let sized = ctx
            .clone()
            .with_definite_size(ctx.definite_width.or(Some(width)), ctx.definite_height.or(Some(height)));
        let Some(frame) = self.open_box(id, &sized)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let content_height = frame.content.height;
        self.close_full(id, &sized, &frame, content_height)
    }

    /// Border-box size of an image: declared sizes win, a single declared
    /// side keeps the intrinsic aspect ratio.
    pub(crate) fn image_border_size(
        &self,
        id: NodeId,
        available_width: f64,
    ) -> Result<(f64, f64), LayoutError> {
        let record = self.tree.get(id)?;
        let RendererKind::Image { width, height, .. } = record.kind else {
            return Err(LayoutError::KindMismatch {
                expected: "image",
                found: record.kind.name(),
            });
        };
        let style = record.style.resolve(available_width, None);
        let bp = style.border_padding();
        let aspect = if width > 0.0 { height / width } else { 1.0 };
        let size = match (style.width.fixed(), style.height.fixed()) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, (w - bp.horizontal()) * aspect + bp.vertical()),
            (None, Some(h)) => {
                let content_h = h - bp.vertical();
                let content_w = if aspect > 0.0 { content_h / aspect } else { width };
                (content_w + bp.horizontal(), h)
            }
            (None, None) => (width + bp.horizontal(), height + bp.vertical()),
        };
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edges, LayoutArea};
    use crate::layout::LayoutTree;
    use crate::style::{Clear, Dimension, Style};
    use std::f64::consts::FRAC_PI_2;

    fn area(width: f64, height: f64) -> LayoutContext {
        LayoutContext::new(LayoutArea::new(0, Rectangle::new(0.0, 0.0, width, height)))
    }

    fn fixed(tree: &mut LayoutTree, width: Option<f64>, height: f64) -> NodeId {
        tree.add(
            RendererKind::Block,
            Style {
                width: width.map(Dimension::Pt),
                height: Some(Dimension::Pt(height)),
                ..Default::default()
            },
        )
    }

    #[test]
    fn children_stack_with_margins_and_padding() {
        let mut tree = LayoutTree::new();
        let root = tree.add(
            RendererKind::Block,
            Style {
                padding: Some(Edges::uniform(5.0)),
                ..Default::default()
            },
        );
        let a = fixed(&mut tree, None, 20.0);
        let b = tree.add(
            RendererKind::Block,
            Style {
                height: Some(Dimension::Pt(10.0)),
                margin: Some(Edges::symmetric(4.0, 0.0)),
                ..Default::default()
            },
        );
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 200.0)).unwrap();
        assert!(result.is_full());
        let occupied = result.occupied_area.unwrap().bbox;
        // 5 + 20 + 4 + 10 + 4 + 5
        assert!((occupied.height - 48.0).abs() < 0.01, "height {}", occupied.height);
        let b_box = engine.tree().get(b).unwrap().border_box.unwrap();
        assert!((b_box.y - 29.0).abs() < 0.01);
        assert!((b_box.width - 90.0).abs() < 0.01);
    }

    #[test]
    fn partial_split_keeps_every_child_exactly_once() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        let kids: Vec<NodeId> = (0..4).map(|_| fixed(&mut tree, None, 30.0)).collect();
        for &k in &kids {
            tree.append_child(root, k).unwrap();
        }
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 70.0)).unwrap();
        assert!(result.is_partial());
        let split = engine.tree().children(result.split_renderer.unwrap()).unwrap().to_vec();
        let overflow = engine.tree().children(result.overflow_renderer.unwrap()).unwrap().to_vec();
        assert_eq!(split, kids[..2].to_vec());
        assert_eq!(overflow, kids[2..].to_vec());
    }

    #[test]
    fn first_child_that_cannot_fit_yields_nothing_with_its_cause() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        let big = fixed(&mut tree, None, 500.0);
        tree.append_child(root, big).unwrap();
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 100.0)).unwrap();
        assert!(result.is_nothing());
        assert_eq!(result.cause_of_nothing, Some(big));
    }

    #[test]
    fn area_break_ends_the_area() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        let a = fixed(&mut tree, None, 10.0);
        let brk = tree.add(RendererKind::AreaBreak, Style::default());
        let b = fixed(&mut tree, None, 10.0);
        for k in [a, brk, b] {
            tree.append_child(root, k).unwrap();
        }
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 100.0)).unwrap();
        assert!(result.is_partial());
        let overflow = engine.tree().children(result.overflow_renderer.unwrap()).unwrap();
        assert_eq!(overflow, &[b]);
    }

    #[test]
    fn float_is_beside_and_clear_goes_below() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        let float = tree.add(
            RendererKind::Block,
            Style {
                width: Some(Dimension::Pt(30.0)),
                height: Some(Dimension::Pt(50.0)),
                float: Some(Float::Left),
                ..Default::default()
            },
        );
        let cleared = tree.add(
            RendererKind::Block,
            Style {
                height: Some(Dimension::Pt(10.0)),
                clear: Some(Clear::Left),
                ..Default::default()
            },
        );
        tree.append_child(root, float).unwrap();
        tree.append_child(root, cleared).unwrap();
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 200.0)).unwrap();
        let float_box = engine.tree().get(float).unwrap().border_box.unwrap();
        assert_eq!(float_box, Rectangle::new(0.0, 0.0, 30.0, 50.0));
        let cleared_box = engine.tree().get(cleared).unwrap().border_box.unwrap();
        assert!((cleared_box.y - 50.0).abs() < 0.01);
        assert!((result.occupied_area.unwrap().bbox.height - 60.0).abs() < 0.01);
    }

    #[test]
    fn container_grows_to_contain_its_floats() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        let float = tree.add(
            RendererKind::Block,
            Style {
                width: Some(Dimension::Pt(30.0)),
                height: Some(Dimension::Pt(50.0)),
                float: Some(Float::Right),
                ..Default::default()
            },
        );
        tree.append_child(root, float).unwrap();
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 200.0)).unwrap();
        assert!((result.occupied_area.unwrap().bbox.height - 50.0).abs() < 0.01);
        let float_box = engine.tree().get(float).unwrap().border_box.unwrap();
        assert!((float_box.x - 70.0).abs() < 0.01);
    }

    #[test]
    fn rotation_reports_the_bounding_box() {
        let mut tree = LayoutTree::new();
        let rotated = tree.add(
            RendererKind::Block,
            Style {
                width: Some(Dimension::Pt(80.0)),
                height: Some(Dimension::Pt(20.0)),
                rotation_angle: Some(FRAC_PI_2),
                ..Default::default()
            },
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(rotated, &area(100.0, 100.0)).unwrap();
        let bbox = result.occupied_area.unwrap().bbox;
        assert!((bbox.width - 20.0).abs() < 0.01 && (bbox.height - 80.0).abs() < 0.01);

        let narrow = engine.layout(rotated, &area(100.0, 50.0)).unwrap();
        assert!(narrow.is_nothing());
    }

    #[test]
    fn hidden_overflow_places_and_clips() {
        let mut tree = LayoutTree::new();
        let wide = tree.add(
            RendererKind::Block,
            Style {
                width: Some(Dimension::Pt(150.0)),
                height: Some(Dimension::Pt(10.0)),
                overflow_x: Some(Overflow::Hidden),
                ..Default::default()
            },
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(wide, &area(100.0, 100.0)).unwrap();
        assert!(result.is_full());
        assert_eq!(
            engine.tree().get(wide).unwrap().clip,
            Some(Rectangle::new(0.0, 0.0, 100.0, 10.0))
        );
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn image_keeps_aspect_ratio_from_one_side() {
        let mut tree = LayoutTree::new();
        let image = tree.add(
            RendererKind::Image {
                src: "logo.png".into(),
                width: 200.0,
                height: 100.0,
            },
            Style {
                width: Some(Dimension::Pt(50.0)),
                ..Default::default()
            },
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(image, &area(100.0, 100.0)).unwrap();
        let bbox = result.occupied_area.unwrap().bbox;
        assert!((bbox.width - 50.0).abs() < 0.01 && (bbox.height - 25.0).abs() < 0.01);
    }

    #[test]
    fn image_taller_than_area_is_nothing() {
        let mut tree = LayoutTree::new();
        let image = tree.add(
            RendererKind::Image {
                src: "tall.png".into(),
                width: 10.0,
                height: 300.0,
            },
            Style::default(),
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(image, &area(100.0, 100.0)).unwrap();
        assert_eq!(result.cause_of_nothing, Some(image));
    }
}
