/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use app_units::Au;
use fragmentation::logical_geometry::{LogicalSide, LogicalSideFlags, WritingMode};
use fragmentation::{
    BlockFragmentation, BoxDecorationBreak, ContinuationChain, FragmentId, FragmentStateFlags,
    FragmentStyle, FragmentTree, FragmentType, FragmentationDebugOptions, PseudoStyleType,
    ReflowInput, SplittableFragmentInfo, verify_continuation_chain,
};

fn new_tree() -> FragmentTree {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut options = FragmentationDebugOptions::default();
    options.extend("verify-continuation-chains").unwrap();
    FragmentTree::with_debug_options(options)
}

fn styled(box_decoration_break: BoxDecorationBreak) -> Arc<FragmentStyle> {
    Arc::new(FragmentStyle {
        box_decoration_break,
        ..FragmentStyle::default()
    })
}

/// A fluid chain of block fragments with the given content block sizes, in pixels.
fn chain_with_sizes(tree: &mut FragmentTree, sizes: &[i32]) -> Vec<FragmentId> {
    let mut chain: Vec<FragmentId> = Vec::new();
    for &size in sizes {
        let fragment = match chain.last() {
            Some(&last) => tree.create_continuation(last, true),
            None => tree.insert(SplittableFragmentInfo::new(
                FragmentType::Block,
                Arc::new(FragmentStyle::default()),
            )),
        };
        tree.set_content_block_size(fragment, Au::from_px(size));
        chain.push(fragment);
    }
    chain
}

#[test]
fn test_consumed_block_size_of_fluid_chain() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[30, 40, 50]);

    assert_eq!(tree.consumed_block_size(chain[0]), Au(0));
    assert_eq!(tree.consumed_block_size(chain[1]), Au::from_px(30));
    assert_eq!(tree.consumed_block_size(chain[2]), Au::from_px(70));
    assert_eq!(tree.cached_consumed_block_size(chain[2]), Some(Au::from_px(70)));

    // The first continuation never caches anything.
    assert_eq!(tree.cached_consumed_block_size(chain[0]), None);
    assert_eq!(verify_continuation_chain(&tree, chain[0]), Ok(()));
}

#[test]
fn test_consumed_block_size_reuses_cached_value() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[10, 20, 30, 40]);
    for &fragment in &chain {
        tree.consumed_block_size(fragment);
    }

    // Changing the first fragment doesn't affect fragments whose predecessor
    // already cached its consumed size, until that cache is invalidated.
    tree.set_content_block_size(chain[0], Au::from_px(15));
    assert_eq!(tree.consumed_block_size(chain[3]), Au::from_px(60));

    tree.invalidate_consumed_block_size(chain[2]);
    tree.invalidate_consumed_block_size(chain[3]);
    assert_eq!(tree.cached_consumed_block_size(chain[3]), None);
    assert_eq!(tree.consumed_block_size(chain[1]), Au::from_px(15));
    assert_eq!(tree.consumed_block_size(chain[2]), Au::from_px(35));
    assert_eq!(tree.consumed_block_size(chain[3]), Au::from_px(65));
}

#[test]
fn test_consumed_block_size_skips_overflow_containers() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[50, 50, 100, 10]);
    tree.set_state(
        chain[2],
        FragmentStateFlags::IS_TRUE_OVERFLOW_CONTAINER,
        true,
    );

    assert_eq!(tree.consumed_block_size(chain[1]), Au::from_px(50));
    assert_eq!(tree.consumed_block_size(chain[2]), Au::from_px(100));
    assert_eq!(tree.consumed_block_size(chain[3]), Au::from_px(100));
}

#[test]
fn test_consumed_block_size_is_monotonic() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[0, 25, 0, 0, 60, 5]);

    let mut previous = Au(0);
    for &fragment in &chain {
        let consumed = tree.consumed_block_size(fragment);
        assert!(consumed >= previous);
        previous = consumed;
    }
    let first = tree.first_continuation(chain[5]);
    assert_eq!(tree.consumed_block_size(first), Au(0));
}

#[test]
fn test_remove_from_flow_drops_consumed_block_size() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[10, 20, 30]);
    for &fragment in &chain {
        tree.consumed_block_size(fragment);
    }

    tree.remove_from_flow(chain[2]);
    assert_eq!(tree.cached_consumed_block_size(chain[2]), None);
    assert_eq!(tree.consumed_block_size(chain[2]), Au(0));
    assert_eq!(verify_continuation_chain(&tree, chain[2]), Ok(()));
}

#[test]
fn test_new_head_drops_consumed_block_size() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[10, 20, 30]);
    for &fragment in &chain {
        tree.consumed_block_size(fragment);
    }

    tree.destroy(chain[0]);
    assert_eq!(tree.cached_consumed_block_size(chain[1]), None);
    assert_eq!(tree.consumed_block_size(chain[1]), Au(0));
    assert_eq!(tree.consumed_block_size(chain[2]), Au::from_px(20));
    assert_eq!(verify_continuation_chain(&tree, chain[2]), Ok(()));
}

#[test]
fn test_effective_computed_block_size() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[60, 60]);
    tree.set_state(chain[1], FragmentStateFlags::IN_REFLOW, true);

    let consumed = tree.consumed_block_size(chain[1]);
    let reflow_input = ReflowInput::new(Some(Au::from_px(100)));
    assert_eq!(
        tree.effective_computed_block_size(chain[1], &reflow_input, consumed),
        Some(Au::from_px(40))
    );

    // Continuations may have been stretched beyond the computed size.
    let reflow_input = ReflowInput::new(Some(Au::from_px(50)));
    assert_eq!(
        tree.effective_computed_block_size(chain[1], &reflow_input, consumed),
        Some(Au(0))
    );

    let reflow_input = ReflowInput::new(None);
    assert_eq!(
        tree.effective_computed_block_size(chain[1], &reflow_input, consumed),
        None
    );
}

#[test]
fn test_effective_computed_block_size_of_fieldset_content() {
    let mut tree = new_tree();
    let first_fieldset = tree.insert(
        SplittableFragmentInfo::new(FragmentType::FieldSet, Arc::new(FragmentStyle::default()))
            .with_legend_space(Au::from_px(10)),
    );
    let second_fieldset = tree.create_continuation(first_fieldset, true);
    tree.set_legend_space(second_fieldset, Some(Au::from_px(20)));

    let content_style = Arc::new(FragmentStyle {
        pseudo: PseudoStyleType::FieldsetContent,
        ..FragmentStyle::default()
    });
    let content = tree.insert(
        SplittableFragmentInfo::new(FragmentType::Block, content_style)
            .with_parent(second_fieldset)
            .with_state(
                FragmentStateFlags::IS_TRUE_OVERFLOW_CONTAINER | FragmentStateFlags::IN_REFLOW,
            ),
    );

    let reflow_input = ReflowInput::new(Some(Au::from_px(200)));
    assert_eq!(
        tree.effective_computed_block_size(content, &reflow_input, Au::from_px(50)),
        Some(Au::from_px(120))
    );

    // Only the fieldset-content box gets the legend correction.
    tree.set_state(content, FragmentStateFlags::IS_TRUE_OVERFLOW_CONTAINER, false);
    assert_eq!(
        tree.effective_computed_block_size(content, &reflow_input, Au::from_px(50)),
        Some(Au::from_px(150))
    );
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "outside of reflow")]
fn test_effective_computed_block_size_outside_of_reflow_asserts() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[10]);
    tree.effective_computed_block_size(chain[0], &ReflowInput::default(), Au(0));
}

#[test]
fn test_skip_sides_with_cloned_decorations() {
    let mut tree = new_tree();
    let first = tree.insert(SplittableFragmentInfo::new(
        FragmentType::Block,
        styled(BoxDecorationBreak::Clone),
    ));
    let middle = tree.create_continuation(first, true);
    let last = tree.create_continuation(middle, true);

    assert!(tree.block_level_logical_skip_sides(middle, true).is_empty());

    for fragment in [first, middle, last] {
        tree.set_style(fragment, styled(BoxDecorationBreak::Slice));
    }
    let skip = tree.block_level_logical_skip_sides(middle, false);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_START);

    let skip = tree.block_level_logical_skip_sides(middle, true);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_BOTH);

    let skip = tree.block_level_logical_skip_sides(last, true);
    assert!(skip.block_start());
    assert!(!skip.block_end());

    let skip = tree.block_level_logical_skip_sides(first, true);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_END);
}

#[test]
fn test_skip_sides_of_overflow_containers() {
    let mut tree = new_tree();
    let chain = chain_with_sizes(&mut tree, &[10, 10, 10]);
    tree.set_state(chain[2], FragmentStateFlags::IS_TRUE_OVERFLOW_CONTAINER, true);

    // A next continuation that is an overflow container doesn't split the decorations.
    let skip = tree.block_level_logical_skip_sides(chain[1], true);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_START);

    let skip = tree.block_level_logical_skip_sides(chain[2], false);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_BOTH);

    // Even with cloned decorations.
    tree.set_style(chain[2], styled(BoxDecorationBreak::Clone));
    let skip = tree.block_level_logical_skip_sides(chain[2], false);
    assert_eq!(skip.sides(), LogicalSideFlags::BLOCK_BOTH);
}

#[test]
fn test_skip_sides_with_column_span_siblings() {
    let mut tree = new_tree();
    let fragment = tree.insert(
        SplittableFragmentInfo::new(FragmentType::Block, styled(BoxDecorationBreak::Slice))
            .with_state(FragmentStateFlags::HAS_COLUMN_SPAN_SIBLINGS),
    );

    let skip = tree.block_level_logical_skip_sides(fragment, false);
    assert!(skip.contains(LogicalSide::BlockEnd));
    assert!(!skip.contains(LogicalSide::BlockStart));
}

#[test]
fn test_skip_sides_map_to_physical_sides() {
    let mut tree = new_tree();
    let style = Arc::new(FragmentStyle {
        writing_mode: WritingMode::WRITING_MODE_VERTICAL_RL,
        ..FragmentStyle::default()
    });
    let first = tree.insert(SplittableFragmentInfo::new(FragmentType::Block, style));
    let second = tree.create_continuation(first, true);

    let skip = tree.block_level_logical_skip_sides(second, true);
    assert_eq!(skip.writing_mode(), WritingMode::WRITING_MODE_VERTICAL_RL);
    let physical = skip.to_physical();
    assert!(physical.right);
    assert!(!physical.left);
    assert!(!physical.top);
    assert!(!physical.bottom);
}
