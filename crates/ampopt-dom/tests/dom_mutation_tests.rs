//! Tests for DOM tree mutation methods: remove_child, insert_before, insert_after,
//! move_children, attribute editing and text content.

use ampopt_dom::{DomTree, NodeId};
use quickcheck_macros::quickcheck;

/// Helper to create an element node and return its NodeId.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.create_element(tag, Vec::<(String, String)>::new())
}

/// Asserts the parent/child/sibling links agree for every attached node.
fn assert_consistent(tree: &DomTree, parent: NodeId) {
    let children = tree.children(parent).to_vec();
    for (index, &child) in children.iter().enumerate() {
        assert_eq!(tree.parent(child), Some(parent));
        let expected_prev = index.checked_sub(1).map(|i| children[i]);
        assert_eq!(tree.prev_sibling(child), expected_prev);
        assert_eq!(tree.next_sibling(child), children.get(index + 1).copied());
        assert_eq!(children.iter().filter(|&&c| c == child).count(), 1);
        assert_consistent(tree, child);
    }
}

// ========== remove_child ==========

#[test]
fn test_remove_child_single_child() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let child = alloc_element(&mut tree, "p");
    tree.append_child(parent, child);

    assert_eq!(tree.children(parent).len(), 1);

    tree.remove_child(parent, child);

    assert_eq!(tree.children(parent).len(), 0);
    assert_eq!(tree.parent(child), None);
    assert_eq!(tree.prev_sibling(child), None);
    assert_eq!(tree.next_sibling(child), None);
}

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    let c = alloc_element(&mut tree, "c");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);

    tree.remove_child(parent, b);

    // a and c are siblings now
    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_with_wrong_parent_is_ignored() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    let other = alloc_element(&mut tree, "span");
    tree.append_child(NodeId::ROOT, parent);
    tree.append_child(NodeId::ROOT, other);

    let child = alloc_element(&mut tree, "p");
    tree.append_child(parent, child);

    tree.remove_child(other, child);

    assert_eq!(tree.children(parent), &[child]);
}

// ========== insert_before / insert_after ==========

#[test]
fn test_insert_before_first_child() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let existing = alloc_element(&mut tree, "b");
    tree.append_child(parent, existing);

    let new_child = alloc_element(&mut tree, "a");
    tree.insert_before(parent, new_child, Some(existing));

    // new_child should be first, existing second
    assert_eq!(tree.children(parent), &[new_child, existing]);
    assert_eq!(tree.parent(new_child), Some(parent));
    assert_eq!(tree.next_sibling(new_child), Some(existing));
    assert_eq!(tree.prev_sibling(new_child), None);
    assert_eq!(tree.prev_sibling(existing), Some(new_child));
}

#[test]
fn test_insert_before_none_appends() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, a);
    tree.insert_before(parent, b, None);

    assert_eq!(tree.children(parent), &[a, b]);
}

#[test]
fn test_insert_moves_attached_node() {
    let mut tree = DomTree::new();
    let head = alloc_element(&mut tree, "head");
    let body = alloc_element(&mut tree, "body");
    tree.append_child(NodeId::ROOT, head);
    tree.append_child(NodeId::ROOT, body);

    let script = alloc_element(&mut tree, "script");
    tree.append_child(body, script);
    tree.append_child(head, script);

    assert!(tree.children(body).is_empty());
    assert_eq!(tree.children(head), &[script]);
    assert_consistent(&tree, NodeId::ROOT);
}

#[test]
fn test_insert_after_chains() {
    let mut tree = DomTree::new();
    let head = alloc_element(&mut tree, "head");
    tree.append_child(NodeId::ROOT, head);

    let meta = alloc_element(&mut tree, "meta");
    let title = alloc_element(&mut tree, "title");
    tree.append_child(head, meta);
    tree.append_child(head, title);

    let first = alloc_element(&mut tree, "link");
    let second = alloc_element(&mut tree, "link");
    tree.insert_after(meta, first);
    tree.insert_after(first, second);

    assert_eq!(tree.children(head), &[meta, first, second, title]);
    assert_consistent(&tree, NodeId::ROOT);
}

#[test]
fn test_insert_after_detached_reference_is_noop() {
    let mut tree = DomTree::new();
    let lonely = alloc_element(&mut tree, "div");
    let child = alloc_element(&mut tree, "p");

    tree.insert_after(lonely, child);

    assert_eq!(tree.parent(child), None);
}

// ========== move_children ==========

#[test]
fn test_move_children_appends_to_existing() {
    let mut tree = DomTree::new();
    let from = alloc_element(&mut tree, "div");
    let to = alloc_element(&mut tree, "span");
    tree.append_child(NodeId::ROOT, from);
    tree.append_child(NodeId::ROOT, to);

    let existing = alloc_element(&mut tree, "x");
    tree.append_child(to, existing);

    let moved = alloc_element(&mut tree, "y");
    tree.append_child(from, moved);

    tree.move_children(from, to);

    assert!(tree.children(from).is_empty());
    assert_eq!(tree.children(to), &[existing, moved]);
    // Sibling links between existing and moved
    assert_eq!(tree.next_sibling(existing), Some(moved));
    assert_eq!(tree.prev_sibling(moved), Some(existing));
}

// ========== traversal ==========

#[test]
fn test_preorder_walk_stays_within_subtree() {
    let mut tree = DomTree::new();
    let body = alloc_element(&mut tree, "body");
    let after = alloc_element(&mut tree, "footer");
    tree.append_child(NodeId::ROOT, body);
    tree.append_child(NodeId::ROOT, after);

    let div = alloc_element(&mut tree, "div");
    let img = alloc_element(&mut tree, "img");
    let p = alloc_element(&mut tree, "p");
    tree.append_child(body, div);
    tree.append_child(div, img);
    tree.append_child(body, p);

    assert_eq!(tree.descendants(body), vec![div, img, p]);
    assert_eq!(tree.next_skipping_children(div, body), Some(p));
    assert_eq!(tree.next_in_preorder(p, body), None);
}

#[test]
fn test_head_and_body_lookup() {
    let mut tree = DomTree::new();
    let html = alloc_element(&mut tree, "html");
    let head = alloc_element(&mut tree, "head");
    let body = alloc_element(&mut tree, "body");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, head);
    tree.append_child(html, body);

    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.head(), Some(head));
    assert_eq!(tree.body(), Some(body));
}

// ========== attributes and text ==========

#[test]
fn test_attributes_keep_insertion_order() {
    let mut tree = DomTree::new();
    let link = tree.create_element("link", [("rel", "preload"), ("href", "a.png")]);
    tree.set_attr(link, "as", "image");
    tree.set_attr(link, "REL", "prefetch");

    let names: Vec<&str> = tree
        .as_element(link)
        .map(|e| e.attrs.iter().map(|a| a.name.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["rel", "href", "as"]);
    assert_eq!(tree.attr(link, "rel"), Some("prefetch"));
    assert_eq!(tree.remove_attr(link, "href"), Some("a.png".to_string()));
    assert!(!tree.has_attr(link, "href"));
}

#[test]
fn test_set_text_content_replaces_children() {
    let mut tree = DomTree::new();
    let style = alloc_element(&mut tree, "style");
    tree.append_child(NodeId::ROOT, style);
    let old = tree.create_text("a{}");
    tree.append_child(style, old);

    tree.set_text_content(style, "b{}");

    assert_eq!(tree.text_content(style), "b{}");
    assert_eq!(tree.parent(old), None);
}

// ========== properties ==========

/// Random sequences of appends and insertions never break the sibling links.
#[quickcheck]
fn prop_mutations_keep_links_consistent(ops: Vec<(u8, u8, bool)>) -> bool {
    let mut tree = DomTree::new();
    let mut nodes = vec![NodeId::ROOT];
    for (a, b, append) in ops {
        let parent = nodes[usize::from(a) % nodes.len()];
        let child = alloc_element(&mut tree, "div");
        if append {
            tree.append_child(parent, child);
        } else {
            let reference = tree.children(parent).get(usize::from(b) % 3).copied();
            tree.insert_before(parent, child, reference);
        }
        nodes.push(child);
    }
    assert_consistent(&tree, NodeId::ROOT);
    tree.descendants(NodeId::ROOT).len() == nodes.len() - 1
}
