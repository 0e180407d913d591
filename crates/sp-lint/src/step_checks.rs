use sp_core::{Step, Story};

use crate::Diagnostic;

/// A node path named by a jump, conditional branch or choice option.
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    pub(crate) target: String,
    pub(crate) location: String,
}

#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) references: Vec<Reference>,
}

impl Findings {
    pub(crate) fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(location, message));
    }

    pub(crate) fn warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(location, message));
    }

    fn reference(&mut self, target: &str, location: String) {
        self.references.push(Reference {
            target: target.to_string(),
            location,
        });
    }
}

fn field(location: &str, name: &str) -> String {
    format!("{}.{}", location, name)
}

pub(crate) fn check_step(story: &Story, location: &str, step: &Step, findings: &mut Findings) {
    let kind = step.kind_name();
    match step {
        Step::Background { place } => match place {
            None => findings.error(field(location, "id"), "background is missing \"id\""),
            Some(place) if !story.places.contains_key(place) => findings.error(
                field(location, "id"),
                format!("background uses unknown place \"{}\"", place),
            ),
            Some(_) => {}
        },
        Step::ShowCharacter {
            character,
            pose,
            position,
        } => {
            let found = match character {
                None => {
                    findings.error(field(location, "id"), "show_character is missing \"id\"");
                    None
                }
                Some(id) => {
                    let found = story.characters.get(id);
                    if found.is_none() {
                        findings.error(
                            field(location, "id"),
                            format!("show_character uses unknown character \"{}\"", id),
                        );
                    }
                    found.map(|character| (id, character))
                }
            };
            match (pose, found) {
                (None, _) => {
                    findings.warning(field(location, "pose"), "show_character is missing \"pose\"")
                }
                (Some(pose), Some((id, character))) if !character.poses.contains_key(pose) => {
                    findings.error(
                        field(location, "pose"),
                        format!("character \"{}\" has no pose \"{}\"", id, pose),
                    )
                }
                _ => {}
            }
            if position.is_none() {
                findings.warning(
                    field(location, "position"),
                    "show_character is missing \"position\"",
                );
            }
        }
        Step::HideCharacter { character } => {
            if character.is_none() {
                findings.error(field(location, "id"), "hide_character is missing \"id\"");
            }
        }
        Step::Dialogue { speaker, text } => {
            match speaker {
                None => findings.error(field(location, "who"), "dialogue is missing \"who\""),
                Some(who) if !story.characters.contains_key(who) => findings.error(
                    field(location, "who"),
                    format!("dialogue uses unknown character \"{}\"", who),
                ),
                Some(_) => {}
            }
            if text.is_none() {
                findings.error(field(location, "text"), "dialogue is missing \"text\"");
            }
        }
        Step::Narration { text } => {
            if text.is_none() {
                findings.error(field(location, "text"), "narration is missing \"text\"");
            }
        }
        Step::SetVariable { key, value } => {
            if key.is_none() {
                findings.error(field(location, "key"), "set_variable is missing \"key\"");
            }
            if value.is_none() {
                findings.error(field(location, "value"), "set_variable is missing \"value\"");
            }
        }
        Step::JumpTo { target } => match target {
            None => findings.error(field(location, "nodeId"), "jump_to is missing \"nodeId\""),
            Some(target) => findings.reference(target, field(location, "nodeId")),
        },
        Step::ConditionalJump {
            test,
            then_target,
            else_target,
        } => {
            if test.is_none() {
                findings.error(field(location, "test"), "conditional_jump is missing \"test\"");
            }
            match then_target {
                None => findings.error(
                    field(location, "thenNodeId"),
                    "conditional_jump is missing \"thenNodeId\"",
                ),
                Some(target) => findings.reference(target, field(location, "thenNodeId")),
            }
            if let Some(target) = else_target {
                findings.reference(target, field(location, "elseNodeId"));
            }
        }
        Step::Choice { prompt, options } => {
            if prompt.is_none() {
                findings.warning(field(location, "prompt"), "choice is missing \"prompt\"");
            }
            if options.is_empty() {
                findings.error(field(location, "options"), "choice needs at least one option");
            }
            for (index, option) in options.iter().enumerate() {
                let option_location = format!("{}.options[{}]", location, index);
                if option.label.as_deref().map_or(true, str::is_empty) {
                    findings.error(option_location.clone(), "choice option has no label");
                }
                if let Some(target) = &option.target {
                    findings.reference(target, option_location);
                }
            }
        }
        Step::EndStory => {}
        Step::Unrecognized { .. } => {
            findings.error(location, format!("unknown step kind \"{}\"", kind));
        }
    }
}
