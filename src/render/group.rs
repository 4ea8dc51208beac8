//! Render group flattening
//!
//! Declarative sources nest conditional groups. Rendering wants a flat list
//! where each entry's condition is the conjunction of every enclosing
//! group's condition, and where entries whose conditions reduce to the same
//! canonical form are merged into one ordered list of commands.

use super::{Command, RenderCommand, RenderDescription};
use crate::condition::{ConditionLeaf, ConditionState, ConditionTree};

/// Whether a group's commands are also drawn, transposed, for vertical
/// instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoRotate {
    #[default]
    Off,
    On,
    /// Rotated copies are also mirrored across the component's main axis
    Mirrored,
}

impl AutoRotate {
    pub fn from_token(token: &str) -> Option<AutoRotate> {
        match token.trim().to_ascii_lowercase().as_str() {
            "false" | "off" => Some(AutoRotate::Off),
            "true" | "on" => Some(AutoRotate::On),
            "mirror" | "mirrored" => Some(AutoRotate::Mirrored),
            _ => None,
        }
    }
}

/// A node of the declared group tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderGroup {
    pub conditions: ConditionTree,
    /// `None` inherits the enclosing group's setting
    pub auto_rotate: Option<AutoRotate>,
    pub commands: Vec<RenderCommand>,
    pub children: Vec<RenderGroup>,
}

impl RenderGroup {
    pub fn new(conditions: ConditionTree) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    pub fn with_auto_rotate(mut self, auto_rotate: AutoRotate) -> Self {
        self.auto_rotate = Some(auto_rotate);
        self
    }

    pub fn push_command(&mut self, command: impl Into<RenderCommand>) {
        self.commands.push(command.into());
    }

    pub fn push_child(&mut self, child: RenderGroup) {
        self.children.push(child);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.children.iter().all(RenderGroup::is_empty)
    }
}

fn horizontal(expected: bool) -> ConditionTree {
    ConditionTree::Leaf(ConditionLeaf::State {
        state: ConditionState::Horizontal,
        expected,
    })
}

fn rotated(command: &RenderCommand, mode: AutoRotate) -> RenderCommand {
    let transposed = command.transpose();
    match mode {
        AutoRotate::Mirrored => transposed.flip(true),
        AutoRotate::On | AutoRotate::Off => transposed,
    }
}

fn walk(
    group: &RenderGroup,
    parent: &ConditionTree,
    inherited: AutoRotate,
    out: &mut Vec<(ConditionTree, Vec<RenderCommand>)>,
) {
    let conditions = parent.clone().and(group.conditions.clone());
    let auto_rotate = group.auto_rotate.unwrap_or(inherited);

    if !group.commands.is_empty() {
        match auto_rotate {
            AutoRotate::Off => out.push((conditions.clone(), group.commands.clone())),
            AutoRotate::On | AutoRotate::Mirrored => {
                out.push((conditions.clone().and(horizontal(true)), group.commands.clone()));
                let vertical = group.commands.iter().map(|c| rotated(c, auto_rotate)).collect();
                out.push((conditions.clone().and(horizontal(false)), vertical));
            }
        }
    }

    for child in &group.children {
        walk(child, &conditions, auto_rotate, out);
    }
}

/// Flatten a group tree into render descriptions, merging entries whose
/// conditions simplify to the same form. Entries keep the order in which
/// their condition first appeared; merged command lists keep traversal
/// order.
pub fn flatten_groups(root: &RenderGroup) -> Vec<RenderDescription> {
    let mut flat = Vec::new();
    walk(root, &ConditionTree::Empty, AutoRotate::Off, &mut flat);

    let mut merged: Vec<(String, RenderDescription)> = Vec::new();
    for (conditions, commands) in flat {
        let simplified = conditions.simplify();
        let key = simplified.to_string();
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some((_, description)) => description.commands.extend(commands),
            None => merged.push((key, RenderDescription::new(simplified, commands))),
        }
    }
    merged.into_iter().map(|(_, d)| d).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ComponentPoint;
    use crate::render::{Line, Rectangle};
    use crate::types::FormatVersion;

    fn cond(text: &str) -> ConditionTree {
        ConditionTree::parse(text, FormatVersion::V1_2).unwrap()
    }

    fn line(text: &str) -> RenderCommand {
        let (a, b) = text.split_once(" to ").unwrap();
        Line {
            start: ComponentPoint::parse(a).unwrap(),
            end: ComponentPoint::parse(b).unwrap(),
            thickness: 2.0,
        }
        .into()
    }

    #[test]
    fn sibling_groups_with_same_condition_merge() {
        let mut root = RenderGroup::default();
        let mut first = RenderGroup::new(cond("$type==A"));
        first.push_command(line("Start,Start to End,Start"));
        let mut other = RenderGroup::new(cond("$type==B"));
        other.push_command(line("Start,Start to Start,End"));
        let mut second = RenderGroup::new(cond("$type==A"));
        second.push_command(line("Middle,Start to Middle,End"));
        root.push_child(first);
        root.push_child(other);
        root.push_child(second);

        let flat = flatten_groups(&root);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].conditions.to_string(), "$type==A");
        assert_eq!(
            flat[0].commands,
            [line("Start,Start to End,Start"), line("Middle,Start to Middle,End")]
        );
        assert_eq!(flat[1].conditions.to_string(), "$type==B");
    }

    #[test]
    fn nested_conditions_are_conjoined() {
        let mut root = RenderGroup::default();
        root.push_command(line("Start,Start to End,Start"));
        let mut outer = RenderGroup::new(cond("$a"));
        let mut inner = RenderGroup::new(cond("$b==1"));
        inner.push_command(line("Start,Start to Start,End"));
        let mut redundant = RenderGroup::new(cond("$a"));
        redundant.push_command(line("End,Start to End,End"));
        outer.push_child(inner);
        outer.push_child(redundant);
        root.push_child(outer);

        let flat = flatten_groups(&root);
        let conditions: Vec<String> = flat.iter().map(|d| d.conditions.to_string()).collect();
        assert_eq!(conditions, ["", "($a && $b==1)", "$a"]);
    }

    #[test]
    fn auto_rotate_emits_transposed_copy() {
        let mut root = RenderGroup::default().with_auto_rotate(AutoRotate::On);
        root.push_command(line("Start,Middle+5 to End,Middle+5"));

        let flat = flatten_groups(&root);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].conditions.to_string(), "$horizontal==true");
        assert_eq!(flat[0].commands, [line("Start,Middle+5 to End,Middle+5")]);
        assert_eq!(flat[1].conditions.to_string(), "$horizontal==false");
        assert_eq!(flat[1].commands, [line("Middle+5,Start to Middle+5,End")]);
    }

    #[test]
    fn auto_rotate_is_inherited_and_can_be_overridden() {
        let mut root = RenderGroup::default().with_auto_rotate(AutoRotate::Mirrored);
        let mut child = RenderGroup::new(cond("$a"));
        child.push_command(Rectangle {
            location: ComponentPoint::parse("Start+2,Middle-4").unwrap(),
            width: 10.0,
            height: 8.0,
            thickness: 1.0,
            fill: false,
        });
        let mut fixed = RenderGroup::new(cond("$b")).with_auto_rotate(AutoRotate::Off);
        fixed.push_command(line("Start,Start to End,Start"));
        root.push_child(child);
        root.push_child(fixed);

        let flat = flatten_groups(&root);
        let conditions: Vec<String> = flat.iter().map(|d| d.conditions.to_string()).collect();
        assert_eq!(
            conditions,
            ["($a && $horizontal==true)", "($a && $horizontal==false)", "$b"]
        );

        let RenderCommand::Rectangle(rotated) = &flat[1].commands[0] else {
            panic!("expected a rectangle");
        };
        assert_eq!(rotated.location, ComponentPoint::parse("Middle-4,Start+2").unwrap());
        assert_eq!((rotated.width, rotated.height), (8.0, 10.0));
    }
}
