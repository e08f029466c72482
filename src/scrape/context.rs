// src/scrape/context.rs
use crate::section::SectionResolver;

/// Where the traversal currently is. Supplies restaurant, meal period and section
/// to every record captured while active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuContext {
    pub restaurant: String,
    pub meal_period: String,
    pub section: String,
    section_stack: Vec<String>,
    default_section: String,
}

impl MenuContext {
    pub fn new(restaurant: &str, default_section: &str) -> Self {
        Self {
            restaurant: s!(restaurant),
            meal_period: s!(),
            section: s!(default_section),
            section_stack: Vec::new(),
            default_section: s!(default_section),
        }
    }

    pub fn enter_meal_period(&mut self, label: &str) {
        self.meal_period = s!(label);
        self.reset_sections();
    }

    /// New meal period or menu tab: headings seen so far no longer apply.
    pub fn reset_sections(&mut self) {
        self.section_stack.clear();
        self.section = self.default_section.clone();
    }

    /// A section header row was read. Blank headers leave the current section alone.
    pub fn push_section(&mut self, label: &str, resolver: &SectionResolver) {
        self.section_stack.push(s!(label));
        if let Some(current) = resolver.current_section(&self.section_stack) {
            self.section = current;
        }
    }

    pub fn sections_seen(&self) -> &[String] { &self.section_stack }
}
