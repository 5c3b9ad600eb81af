//! # Flex Container
//!
//! Measures the items of a flex container, runs the flex algorithm from
//! [`crate::layout::flex`] against the area's width, then places the lines
//! that fit. A row container breaks between lines; when not even its first
//! line fits, the items of that line are split individually. A column
//! container without a definite height breaks between items like a block.

use crate::error::LayoutError;
use crate::geometry::{Edges, LayoutArea, Rectangle};
use crate::layout::block::{BoxFrame, StackEnd, StackOutcome};
use crate::layout::flex::{
    align_content_offsets, justify_offsets, partition_into_lines, resolve_flexible_lengths,
    FlexItemCalculationInfo, FlexItemInfo, WrapLine,
};
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, LayoutStatus, NodeId, RendererKind};
use crate::style::{AlignItems, FlexWrap, ResolvedStyle};

#[derive(Debug, Clone, Copy)]
struct PlacedItem {
    node: NodeId,
    /// Border box.
    rect: Rectangle,
    margin: Edges,
    /// Cross size imposed by the line rather than by the item's content.
    stretched: bool,
}

#[derive(Debug, Clone)]
struct FlexLine {
    items: Vec<PlacedItem>,
    /// Offset of the line from the start of the cross axis.
    cross_start: f64,
    cross_size: f64,
}

impl FlexLine {
    fn cross_end(&self) -> f64 {
        self.cross_start + self.cross_size
    }
}

struct MeasuredItem {
    node: NodeId,
    style: ResolvedStyle,
    info: FlexItemCalculationInfo,
}

impl LayoutEngine {
    /// Run the flex algorithm for container `id` offered `available`, and
    /// return every item's border box grouped by line.
    pub fn flex_lines(
        &mut self,
        id: NodeId,
        available: Rectangle,
    ) -> Result<Vec<Vec<FlexItemInfo>>, LayoutError> {
        let ctx = LayoutContext::new(LayoutArea::new(0, available)).forced(true);
        let Some(frame) = self.open_box(id, &ctx)? else {
            return Ok(Vec::new());
        };
        let children = self.tree.children(id)?.to_vec();
        let lines = self.resolve_flex_lines(&frame, &children)?;
        Ok(lines
            .into_iter()
            .map(|line| {
                line.items
                    .into_iter()
                    .map(|item| FlexItemInfo {
                        renderer: item.node,
                        rectangle: item.rect,
                    })
                    .collect()
            })
            .collect())
    }

    pub(crate) fn layout_flex(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let children = self.tree.children(id)?.to_vec();
        let lines = self.resolve_flex_lines(&frame, &children)?;

        if !frame.style.flex_direction.is_row() {
            let outcome = self.place_flex_column(ctx, &frame, &children, &lines)?;
            return self.finish_stack(id, ctx, &frame, &children, outcome);
        }

        let content = frame.content;
        let limit = content.bottom();
        let eps = self.config.epsilon;
        // A box of fixed height already fits; its lines may overflow it.
        let first_unfit = lines
            .iter()
            .position(|line| content.y + line.cross_end() > limit + eps)
            .filter(|_| frame.fixed_height.is_none());
        let wrap_reverse = frame.style.flex_wrap == FlexWrap::WrapReverse;

        let (placed, end) = match first_unfit {
            None => (lines.len(), StackEnd::Complete),
            // Reversed lines are out of child order and cannot be cut apart.
            Some(_) if wrap_reverse && ctx.forced_placement => (lines.len(), StackEnd::Complete),
            Some(_) if wrap_reverse => return Ok(LayoutResult::nothing(id)),
            Some(0) => return self.split_first_flex_line(id, ctx, &frame, &children, &lines),
            Some(k) => {
                let index = lines[k]
                    .items
                    .first()
                    .and_then(|item| children.iter().position(|&c| c == item.node))
                    .unwrap_or(children.len());
                (
                    k,
                    StackEnd::Break {
                        index,
                        split: None,
                        overflow: None,
                    },
                )
            }
        };

        for line in &lines[..placed] {
            for item in &line.items {
                self.place_flex_item(ctx, item, item.stretched)?;
            }
        }
        let bottom = lines[..placed]
            .last()
            .map_or(content.y, |line| content.y + line.cross_end());
        self.finish_stack(id, ctx, &frame, &children, StackOutcome { bottom, end })
    }

    /// Min/max content width contributed by flex items.
    pub(crate) fn flex_min_max(
        &mut self,
        children: &[NodeId],
        style: &ResolvedStyle,
    ) -> Result<(f64, f64), LayoutError> {
        let (mut sum_min, mut sum_max, mut max_min, mut max_max) = (0.0, 0.0, 0.0_f64, 0.0_f64);
        let mut count: usize = 0;
        for &child in children {
            if self.tree.get(child)?.kind == RendererKind::AreaBreak {
                continue;
            }
            let m = self.min_max_width(child)?;
            sum_min += m.min_width;
            sum_max += m.max_width;
            max_min = max_min.max(m.min_width);
            max_max = max_max.max(m.max_width);
            count += 1;
        }
        if !style.flex_direction.is_row() {
            return Ok((max_min, max_max));
        }
        let gaps = style.column_gap * count.saturating_sub(1) as f64;
        let min = match style.flex_wrap {
            FlexWrap::NoWrap => sum_min + gaps,
            FlexWrap::Wrap | FlexWrap::WrapReverse => max_min,
        };
        Ok((min, sum_max + gaps))
    }

    fn resolve_flex_lines(
        &mut self,
        frame: &BoxFrame,
        children: &[NodeId],
    ) -> Result<Vec<FlexLine>, LayoutError> {
        let style = &frame.style;
        let content = frame.content;
        let row = style.flex_direction.is_row();
        let inner_height = frame
            .fixed_height
            .map(|h| (h - style.border_padding().vertical()).max(0.0));
        let (main_available, definite_cross) = if row {
            (content.width, inner_height)
        } else {
            (inner_height.unwrap_or(f64::INFINITY), Some(content.width))
        };
        let (main_gap, cross_gap) = if row {
            (style.column_gap, style.row_gap)
        } else {
            (style.row_gap, style.column_gap)
        };

        let mut items = Vec::with_capacity(children.len());
        for &child in children {
            if self.tree.get(child)?.kind == RendererKind::AreaBreak {
                continue;
            }
            let item_style = self.resolve_style(child, content.width, inner_height)?;
            let info = if row {
                self.row_item_info(child, &item_style)?
            } else {
                self.column_item_info(child, &item_style, content.width)?
            };
            items.push(MeasuredItem {
                node: child,
                style: item_style,
                info,
            });
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let hypothetical: Vec<f64> = items
            .iter()
            .map(|i| i.info.outer_hypothetical_main_size())
            .collect();
        let mut spans = if style.flex_wrap != FlexWrap::NoWrap && main_available.is_finite() {
            partition_into_lines(&hypothetical, main_gap, main_available)
        } else {
            vec![WrapLine {
                start: 0,
                end: items.len(),
            }]
        };
        if style.flex_wrap == FlexWrap::WrapReverse {
            spans.reverse();
        }

        // Main sizes and cross sizes per line.
        let mut sized = Vec::with_capacity(spans.len());
        for span in &spans {
            let members = &items[span.start..span.end];
            let gaps = main_gap * members.len().saturating_sub(1) as f64;
            let mut infos: Vec<FlexItemCalculationInfo> = members.iter().map(|m| m.info.clone()).collect();
            let line_main = if main_available.is_finite() {
                main_available
            } else {
                hypothetical[span.start..span.end].iter().sum::<f64>() + gaps
            };
            resolve_flexible_lengths(&mut infos, line_main - gaps);

            let mut crosses = Vec::with_capacity(members.len());
            for (member, info) in members.iter().zip(&infos) {
                let cross = if row {
                    self.row_item_cross(member, info.main_size, inner_height)?
                } else {
                    self.column_item_cross(member, content.width)?
                };
                crosses.push(cross);
            }
            let line_cross = crosses.iter().copied().fold(0.0, f64::max);
            sized.push((span.start, infos, crosses, line_cross, line_main));
        }

        // Cross placement of the lines.
        let (mut cursor, mut between) = (0.0, 0.0);
        match definite_cross {
            Some(cross) if sized.len() == 1 => sized[0].3 = cross,
            Some(cross) => {
                let used: f64 = sized.iter().map(|s| s.3).sum::<f64>() + cross_gap * (sized.len() - 1) as f64;
                let (start, gap, extra) = align_content_offsets(style.align_content, cross - used, sized.len());
                cursor = start;
                between = gap;
                for line in &mut sized {
                    line.3 += extra;
                }
            }
            None => {}
        }

        let reverse = style.flex_direction.is_reverse();
        let mut lines = Vec::with_capacity(sized.len());
        for (start, infos, crosses, line_cross, line_main) in sized {
            let members = &items[start..start + infos.len()];
            let outer_sum: f64 = infos.iter().map(|i| i.main_size + i.margin).sum();
            let gaps = main_gap * infos.len().saturating_sub(1) as f64;
            let (lead, spacing) = justify_offsets(style.justify_content, line_main - gaps - outer_sum, infos.len());

            let mut main_cursor = lead;
            let mut placed = Vec::with_capacity(infos.len());
            for ((member, info), &outer_cross) in members.iter().zip(&infos).zip(&crosses) {
                let margin = member.style.margin;
                let (main_before, main_after, cross_before, cross_after) = if row {
                    (margin.left, margin.right, margin.top, margin.bottom)
                } else {
                    (margin.top, margin.bottom, margin.left, margin.right)
                };
                let size = info.main_size;
                let mut main_pos = main_cursor + main_before;
                main_cursor += main_before + size + main_after + main_gap + spacing;
                if reverse {
                    main_pos = line_main - main_pos - size;
                }

                let align = member.style.align_self.unwrap_or(style.align_items);
                let fixed_cross = if row {
                    member.style.height.fixed()
                } else {
                    member.style.width.fixed()
                };
                let stretched = align == AlignItems::Stretch && fixed_cross.is_none();
                let cross_size = if stretched {
                    let stretched_size = (line_cross - cross_before - cross_after).max(0.0);
                    if row {
                        member.style.clamp_height(stretched_size)
                    } else {
                        member.style.clamp_width(stretched_size)
                    }
                } else {
                    (outer_cross - cross_before - cross_after).max(0.0)
                };
                let offset = match align {
                    AlignItems::FlexEnd => line_cross - outer_cross,
                    AlignItems::Center => (line_cross - outer_cross) / 2.0,
                    _ => 0.0,
                };
                let cross_pos = cursor + offset + cross_before;

                let rect = if row {
                    Rectangle::new(content.x + main_pos, content.y + cross_pos, size, cross_size)
                } else {
                    Rectangle::new(content.x + cross_pos, content.y + main_pos, cross_size, size)
                };
                placed.push(PlacedItem {
                    node: member.node,
                    rect,
                    margin,
                    stretched,
                });
            }
            lines.push(FlexLine {
                items: placed,
                cross_start: cursor,
                cross_size: line_cross,
            });
            cursor += line_cross + cross_gap + between;
        }
        Ok(lines)
    }

    fn row_item_info(
        &mut self,
        child: NodeId,
        style: &ResolvedStyle,
    ) -> Result<FlexItemCalculationInfo, LayoutError> {
        let metrics = self.min_max_width(child)?;
        let margin = style.margin.horizontal();
        let bp = style.border_padding().horizontal();
        let basis = style
            .flex_basis
            .fixed()
            .or(style.width.fixed())
            .unwrap_or(metrics.max_width - margin);
        // Automatic minimum: content cannot shrink below its widest
        // unbreakable piece, nor past a declared width.
        let content_min = metrics.children_min_width + bp;
        let auto_min = style.width.fixed().map_or(content_min, |w| content_min.min(w));
        let min = style.min_width.max(auto_min).max(bp);
        Ok(FlexItemCalculationInfo::new(basis, style.flex_grow, style.flex_shrink)
            .with_bounds(min, style.max_width.max(min))
            .with_margin(margin))
    }

    fn column_item_info(
        &mut self,
        child: NodeId,
        style: &ResolvedStyle,
        width: f64,
    ) -> Result<FlexItemCalculationInfo, LayoutError> {
        let margin = style.margin.vertical();
        let basis = match style.flex_basis.fixed().or(style.height.fixed()) {
            Some(basis) => basis,
            None => self.measure_height(child, width)? - margin,
        };
        let min = style.min_height.max(style.border_padding().vertical());
        Ok(FlexItemCalculationInfo::new(basis.max(0.0), style.flex_grow, style.flex_shrink)
            .with_bounds(min, style.max_height.max(min))
            .with_margin(margin))
    }

    /// Outer height of a row item at a main size.
    fn row_item_cross(
        &mut self,
        item: &MeasuredItem,
        main_size: f64,
        inner_height: Option<f64>,
    ) -> Result<f64, LayoutError> {
        let margin = item.style.margin;
        if let Some(height) = item.style.height.fixed() {
            return Ok(height + margin.vertical());
        }
        let node = item.node;
        let outer_width = main_size + margin.horizontal();
        self.cached_cross_size(node, main_size, inner_height, |engine| {
            engine.measure(node, outer_width, Some(main_size))
        })
    }

    /// Outer width of a column item.
    fn column_item_cross(&mut self, item: &MeasuredItem, available: f64) -> Result<f64, LayoutError> {
        let margin = item.style.margin.horizontal();
        if let Some(width) = item.style.width.fixed() {
            return Ok(width + margin);
        }
        if item.style.align_self.unwrap_or(AlignItems::Stretch) == AlignItems::Stretch {
            return Ok(available);
        }
        let metrics = self.min_max_width(item.node)?;
        Ok(metrics.max_width.min(available).max(metrics.min_width))
    }

    /// Lay an item out in the slot the flex algorithm measured for it.
    fn place_flex_item(
        &mut self,
        ctx: &LayoutContext,
        item: &PlacedItem,
        definite_height: bool,
    ) -> Result<LayoutResult, LayoutError> {
        let slot = ctx
            .child(item.rect.expand(&item.margin))
            .forced(true)
            .with_definite_size(Some(item.rect.width), definite_height.then_some(item.rect.height));
        self.layout(item.node, &slot)
    }

    /// Items of a column container stacked down the area.
    fn place_flex_column(
        &mut self,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
        lines: &[FlexLine],
    ) -> Result<StackOutcome, LayoutError> {
        let content = frame.content;
        let limit = content.bottom();
        let eps = self.config.epsilon;
        let definite_main = frame.fixed_height.is_some();
        let mut bottom = content.y;
        let mut placed_any = false;

        for item in lines.iter().flat_map(|line| line.items.iter()) {
            let outer_bottom = item.rect.bottom() + item.margin.bottom;
            if outer_bottom <= limit + eps || definite_main {
                self.place_flex_item(ctx, item, definite_main)?;
                bottom = bottom.max(outer_bottom);
                placed_any = true;
                continue;
            }

            let index = children
                .iter()
                .position(|&c| c == item.node)
                .unwrap_or(children.len());
            let top = item.rect.y - item.margin.top;
            let slot = ctx
                .child(Rectangle::new(
                    item.rect.x - item.margin.left,
                    top,
                    item.rect.width + item.margin.horizontal(),
                    (limit - top).max(0.0),
                ))
                .forced(ctx.forced_placement && !placed_any)
                .with_definite_size(Some(item.rect.width), None);
            let result = self.layout(item.node, &slot)?;
            match result.status {
                LayoutStatus::Full => {
                    bottom = bottom.max(result.bottom().unwrap_or(bottom));
                    placed_any = true;
                }
                LayoutStatus::Partial => {
                    bottom = bottom.max(result.bottom().unwrap_or(bottom));
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
                            cause: result.cause_of_nothing.unwrap_or(item.node),
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
        if definite_main {
            bottom = bottom.max(content.bottom());
        }
        Ok(StackOutcome {
            bottom,
            end: StackEnd::Complete,
        })
    }

    /// The first line is taller than the space left: cut each of its items
    /// at the bottom of the area.
    fn split_first_flex_line(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
        lines: &[FlexLine],
    ) -> Result<LayoutResult, LayoutError> {
        let limit = frame.content.bottom();
        let mut split_children = Vec::new();
        let mut overflow_children = Vec::new();
        let mut bottom = frame.content.y;

        for item in lines.iter().take(1).flat_map(|line| line.items.iter()) {
            let top = item.rect.y - item.margin.top;
            let slot = ctx
                .child(Rectangle::new(
                    item.rect.x - item.margin.left,
                    top,
                    item.rect.width + item.margin.horizontal(),
                    (limit - top).max(0.0),
                ))
                .forced(ctx.forced_placement)
                .with_definite_size(Some(item.rect.width), None);
            let result = self.layout(item.node, &slot)?;
            match (result.status, result.split_renderer, result.overflow_renderer) {
                (LayoutStatus::Full, ..) => split_children.push(item.node),
                (LayoutStatus::Partial, Some(split), Some(overflow)) => {
                    split_children.push(split);
                    overflow_children.push(overflow);
                }
                _ => {
                    let cause = if frame.style.keep_together {
                        id
                    } else {
                        result.cause_of_nothing.unwrap_or(item.node)
                    };
                    return Ok(LayoutResult::nothing(cause));
                }
            }
            bottom = bottom.max(result.bottom().unwrap_or(bottom));
        }
        for line in lines.iter().skip(1) {
            overflow_children.extend(line.items.iter().map(|item| item.node));
        }
        log::debug!(
            "flex {id}: first line cut, {} pieces carried over",
            overflow_children.len()
        );

        let content_height = (bottom - frame.content.y).max(0.0);
        if overflow_children.is_empty() {
            return self.close_full(id, ctx, frame, content_height);
        }
        // Area breaks are not flex items and go with the remainder.
        overflow_children.extend(
            children
                .iter()
                .filter(|&&c| self.tree.get(c).is_ok_and(|r| r.kind == RendererKind::AreaBreak)),
        );
        self.split_box(id, ctx, frame, content_height, split_children, overflow_children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LayoutArea;
    use crate::layout::LayoutTree;
    use crate::style::{Dimension, FlexDirection, JustifyContent, Style};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    fn container(tree: &mut LayoutTree, style: Style, items: Vec<Style>) -> (NodeId, Vec<NodeId>) {
        let root = tree.add(RendererKind::Flex, style);
        let ids = items
            .into_iter()
            .map(|s| {
                let id = tree.add(RendererKind::Block, s);
                tree.append_child(root, id).unwrap();
                id
            })
            .collect();
        (root, ids)
    }

    fn sized(width: f64, height: f64) -> Style {
        Style {
            width: Some(Dimension::Pt(width)),
            height: Some(Dimension::Pt(height)),
            ..Default::default()
        }
    }

    fn area(width: f64, height: f64) -> LayoutContext {
        LayoutContext::new(LayoutArea::new(0, Rectangle::new(0.0, 0.0, width, height)))
    }

    #[test]
    fn equal_growth_fills_a_fixed_container() {
        let mut tree = LayoutTree::new();
        let grow = Style {
            flex_grow: Some(1.0),
            flex_shrink: Some(1.0),
            ..Default::default()
        };
        let (root, _) = container(&mut tree, sized(400.0, 100.0), vec![grow.clone(), grow.clone(), grow]);
        let mut engine = LayoutEngine::new(tree);
        let lines = engine.flex_lines(root, Rectangle::new(0.0, 0.0, 400.0, 100.0)).unwrap();
        assert_eq!(lines.len(), 1);
        for (i, item) in lines[0].iter().enumerate() {
            assert!(close(item.rectangle.width, 133.33), "width {}", item.rectangle.width);
            assert!(close(item.rectangle.height, 100.0));
            assert!(close(item.rectangle.x, 133.333 * i as f64));
        }
    }

    #[test]
    fn shrink_is_weighted_by_basis() {
        let mut tree = LayoutTree::new();
        let items = [100.0, 200.0, 300.0]
            .iter()
            .map(|&b| Style {
                flex_basis: Some(Dimension::Pt(b)),
                flex_grow: Some(0.0),
                flex_shrink: Some(1.0),
                ..Default::default()
            })
            .collect();
        let (root, _) = container(&mut tree, Style::default(), items);
        let mut engine = LayoutEngine::new(tree);
        let lines = engine.flex_lines(root, Rectangle::new(0.0, 0.0, 400.0, 100.0)).unwrap();
        let widths: Vec<f64> = lines[0].iter().map(|i| i.rectangle.width).collect();
        assert!(close(widths[0], 66.67) && close(widths[1], 133.33) && close(widths[2], 200.0));
    }

    #[test]
    fn wrapping_lines_break_across_areas() {
        let mut tree = LayoutTree::new();
        let (root, items) = container(
            &mut tree,
            Style {
                flex_wrap: Some(FlexWrap::Wrap),
                ..Default::default()
            },
            (0..4).map(|_| sized(60.0, 40.0)).collect(),
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 50.0)).unwrap();
        assert!(result.is_partial());
        let split = engine.tree().children(result.split_renderer.unwrap()).unwrap().to_vec();
        let overflow = engine.tree().children(result.overflow_renderer.unwrap()).unwrap().to_vec();
        assert_eq!(split, vec![items[0]]);
        assert_eq!(overflow, items[1..].to_vec());
    }

    #[test]
    fn justify_center_and_reverse() {
        let mut tree = LayoutTree::new();
        let (root, _) = container(
            &mut tree,
            Style {
                justify_content: Some(JustifyContent::Center),
                flex_direction: Some(FlexDirection::RowReverse),
                ..Default::default()
            },
            vec![sized(20.0, 10.0), sized(30.0, 10.0)],
        );
        let mut engine = LayoutEngine::new(tree);
        let lines = engine.flex_lines(root, Rectangle::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        let xs: Vec<f64> = lines[0].iter().map(|i| i.rectangle.x).collect();
        // Centred block 25..75, mirrored.
        assert!(close(xs[0], 55.0) && close(xs[1], 25.0), "{xs:?}");
    }

    #[test]
    fn column_container_stacks_and_splits_between_items() {
        let mut tree = LayoutTree::new();
        let (root, items) = container(
            &mut tree,
            Style {
                flex_direction: Some(FlexDirection::Column),
                ..Default::default()
            },
            (0..3).map(|_| sized(50.0, 40.0)).collect(),
        );
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(root, &area(100.0, 90.0)).unwrap();
        assert!(result.is_partial());
        let overflow = engine.tree().children(result.overflow_renderer.unwrap()).unwrap().to_vec();
        assert_eq!(overflow, vec![items[2]]);
        let second = engine.tree().get(items[1]).unwrap().border_box.unwrap();
        assert!(close(second.y, 40.0));
    }

    #[test]
    fn item_cross_sizes_are_cached_per_main_size() {
        let mut tree = LayoutTree::new();
        let (root, items) = container(
            &mut tree,
            Style::default(),
            vec![Style {
                flex_grow: Some(1.0),
                ..Default::default()
            }],
        );
        let mut engine = LayoutEngine::new(tree);
        engine.flex_lines(root, Rectangle::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        engine.flex_lines(root, Rectangle::new(0.0, 0.0, 80.0, 50.0)).unwrap();
        let cache = &engine.tree().get(items[0]).unwrap().cross_size_cache;
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cross_size_cache_separates_container_heights() {
        let mut tree = LayoutTree::new();
        let (root, items) = container(
            &mut tree,
            Style {
                height: Some(Dimension::Pt(50.0)),
                ..Default::default()
            },
            vec![Style {
                flex_grow: Some(1.0),
                ..Default::default()
            }],
        );
        let mut engine = LayoutEngine::new(tree);
        engine.flex_lines(root, Rectangle::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        engine.tree_mut().get_mut(root).unwrap().style.height = Some(Dimension::Pt(80.0));
        engine.flex_lines(root, Rectangle::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        let cache = &engine.tree().get(items[0]).unwrap().cross_size_cache;
        assert_eq!(cache.len(), 2);
        assert!(cache.keys().all(|(main, _)| f64::from_bits(*main) == 100.0));
    }

    #[test]
    fn row_metrics_add_items_and_gaps() {
        let mut tree = LayoutTree::new();
        let (root, _) = container(
            &mut tree,
            Style {
                column_gap: Some(10.0),
                ..Default::default()
            },
            vec![sized(30.0, 10.0), sized(50.0, 10.0)],
        );
        let mut engine = LayoutEngine::new(tree);
        let m = engine.min_max_width(root).unwrap();
        assert!((m.min_width - 90.0).abs() < 0.01, "min {}", m.min_width);
        assert!((m.max_width - 90.0).abs() < 0.01);
    }
}
