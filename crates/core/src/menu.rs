//! Static navigation menu.
//!
//! The tree drives both the sidebar and label/breadcrumb resolution. Lookups
//! only search the top level and one level of children.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuNode {
    pub key: &'static str,
    pub label: &'static str,
    pub children: &'static [MenuNode],
}

impl MenuNode {
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

pub static MENU: &[MenuNode] = &[
    MenuNode {
        key: "dashboard",
        label: "仪表盘",
        children: &[],
    },
    MenuNode {
        key: "user",
        label: "用户管理",
        children: &[
            MenuNode {
                key: "user-list",
                label: "用户列表",
                children: &[],
            },
            MenuNode {
                key: "user-group",
                label: "用户组",
                children: &[],
            },
        ],
    },
    MenuNode {
        key: "settings",
        label: "系统设置",
        children: &[
            MenuNode {
                key: "system",
                label: "系统配置",
                children: &[],
            },
            MenuNode {
                key: "permission",
                label: "权限管理",
                children: &[],
            },
        ],
    },
];

pub fn find_top_level(key: &str) -> Option<&'static MenuNode> {
    MENU.iter().find(|node| node.key == key)
}

/// Finds `key` among the children of top-level nodes, returning the parent
/// alongside the match.
pub fn find_child(key: &str) -> Option<(&'static MenuNode, &'static MenuNode)> {
    MENU.iter().find_map(|parent| {
        parent
            .children
            .iter()
            .find(|child| child.key == key)
            .map(|child| (parent, child))
    })
}

pub fn find(key: &str) -> Option<&'static MenuNode> {
    find_top_level(key).or_else(|| find_child(key).map(|(_, child)| child))
}

/// Label for a menu key, or the key itself when the menu does not know it.
pub fn resolve_label(key: &str) -> String {
    find(key)
        .map(|node| node.label.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Breadcrumb trail for a tab. `fallback` is used when the key is not in
/// the menu.
pub fn breadcrumb(key: &str, fallback: &str) -> Vec<String> {
    if let Some(node) = find_top_level(key) {
        return vec![node.label.to_string()];
    }
    if let Some((parent, child)) = find_child(key) {
        return vec![parent.label.to_string(), child.label.to_string()];
    }
    vec![fallback.to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuRow {
    pub node: &'static MenuNode,
    pub depth: usize,
}

/// Depth-first rows for rendering. Groups are always expanded.
pub fn rows() -> Vec<MenuRow> {
    let mut out = Vec::new();
    for node in MENU {
        out.push(MenuRow { node, depth: 0 });
        for child in node.children {
            out.push(MenuRow {
                node: child,
                depth: 1,
            });
        }
    }
    out
}

/// Rows shown when the sidebar is collapsed: top-level entries only.
pub fn collapsed_rows() -> Vec<MenuRow> {
    MENU.iter().map(|node| MenuRow { node, depth: 0 }).collect()
}
