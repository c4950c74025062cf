use qualgate::plan::{Autopilot, ChapterRef, CheckRef, Item, ManualAnswer, RequirementRef};
use qualgate::types::Status;

/// Builder for [`Item`] to simplify test setup.
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(chapter: &str, requirement: &str, check: &str) -> Self {
        Self {
            item: Item {
                chapter: ChapterRef {
                    id: chapter.to_string(),
                    ..ChapterRef::default()
                },
                requirement: RequirementRef {
                    id: requirement.to_string(),
                    ..RequirementRef::default()
                },
                check: CheckRef {
                    id: check.to_string(),
                    ..CheckRef::default()
                },
                ..Item::default()
            },
        }
    }

    pub fn chapter_title(mut self, title: &str) -> Self {
        self.item.chapter.title = title.to_string();
        self
    }

    pub fn requirement_title(mut self, title: &str) -> Self {
        self.item.requirement.title = title.to_string();
        self
    }

    pub fn check_title(mut self, title: &str) -> Self {
        self.item.check.title = title.to_string();
        self
    }

    pub fn manual(mut self, status: Status, reason: &str) -> Self {
        self.item.manual = Some(ManualAnswer {
            status,
            reason: reason.to_string(),
        });
        self
    }

    pub fn autopilot(mut self, name: &str, run: &str) -> Self {
        let autopilot = self.item.autopilot.get_or_insert_with(Autopilot::default);
        autopilot.name = name.to_string();
        autopilot.run = run.to_string();
        self
    }

    pub fn autopilot_env(mut self, key: &str, value: &str) -> Self {
        let autopilot = self.item.autopilot.get_or_insert_with(Autopilot::default);
        autopilot.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.item.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn config_file(mut self, filename: &str, content: &str) -> Self {
        self.item
            .config
            .insert(filename.to_string(), content.to_string());
        self
    }

    pub fn app_path(mut self, path: &str) -> Self {
        self.item.app_path = path.to_string();
        self
    }

    pub fn validation_err(mut self, message: &str) -> Self {
        self.item.validation_err = Some(message.to_string());
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}
