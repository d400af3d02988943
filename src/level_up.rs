//! Queue of level-up choice prompts.
//!
//! Requests are answered strictly in FIFO order. Only the front request can
//! be open; answering it applies the chosen option and pops it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::catalog::LevelChoiceOption;
use crate::error::ActionRefusal;
use crate::party::Party;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpRequest {
    pub member: usize,
    pub level: u32,
    pub options: Vec<LevelChoiceOption>,
    /// Highlighted option
    #[serde(default)]
    pub selection: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpQueue {
    requests: VecDeque<LevelUpRequest>,
    open: bool,
}

impl LevelUpQueue {
    pub fn push(&mut self, request: LevelUpRequest) {
        self.requests.push_back(request);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn front(&self) -> Option<&LevelUpRequest> {
        self.requests.front()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the front request's prompt
    pub fn open(&mut self) -> Option<&LevelUpRequest> {
        self.open = !self.requests.is_empty();
        self.requests.front()
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Portrait indicator: any pending request for this member
    pub fn has_pending_for(&self, member: usize) -> bool {
        self.requests.iter().any(|r| r.member == member)
    }

    /// Move the highlight within the front request
    pub fn highlight(&mut self, index: usize) -> Result<(), ActionRefusal> {
        let front = self.requests.front_mut().ok_or(ActionRefusal::InvalidIndex)?;
        if index >= front.options.len() {
            return Err(ActionRefusal::InvalidIndex);
        }
        front.selection = index;
        Ok(())
    }

    /// Apply an option of the front request and pop it. A refused option
    /// leaves the request queued.
    pub fn choose(&mut self, option: usize, party: &mut Party) -> Result<LevelChoiceOption, ActionRefusal> {
        let front = self.requests.front().ok_or(ActionRefusal::InvalidIndex)?;
        let choice = front.options.get(option).cloned().ok_or(ActionRefusal::InvalidIndex)?;
        let member = party.member_mut(front.member)?;
        match &choice {
            LevelChoiceOption::LearnSpell { school, spell } => member.learn_spell(*school, spell)?,
            LevelChoiceOption::SkillMastery { skill } => {
                member.raise_skill_mastery(*skill);
            }
            LevelChoiceOption::SchoolMastery { school } => {
                member.raise_school_mastery(*school);
            }
        }
        self.requests.pop_front();
        self.open = false;
        Ok(choice)
    }

    /// Choose the highlighted option of the front request
    pub fn confirm(&mut self, party: &mut Party) -> Result<LevelChoiceOption, ActionRefusal> {
        let selection = self.requests.front().map(|r| r.selection).ok_or(ActionRefusal::InvalidIndex)?;
        self.choose(selection, party)
    }
}
