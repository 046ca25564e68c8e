use crate::editable::Editable;
use crate::vdom::DomId;

impl Editable {
    pub fn composition_start(&mut self, target: Option<DomId>) {
        if !self.is_selectable_target(target) || self.quirks.android {
            return;
        }
        self.state.composition_aborted = false;
        self.set_composing(true);
        if self.editor.selection().is_some_and(|s| s.is_expanded()) {
            let result = self.editor.delete_fragment();
            self.log_model("delete selection for composition", result);
            self.flush_changes();
        }
    }

    pub fn composition_update(&mut self, target: Option<DomId>) {
        if self.is_selectable_target(target) && !self.locator.composing {
            self.set_composing(true);
        }
    }

    /// Handle `compositionend`. Returns whether the browser must call
    /// [`Editable::composition_settled`] from a microtask.
    pub fn composition_end(&mut self, target: Option<DomId>, data: Option<&str>) -> bool {
        if !self.is_selectable_target(target) {
            return false;
        }
        if std::mem::take(&mut self.state.composition_aborted) {
            tracing::debug!(target: "weaver::input", "ignoring end of an aborted composition");
            return false;
        }
        let settle = self.locator.composing;
        if self.quirks.android {
            return settle;
        }

        // These platforms commit through `insertFromComposition` instead.
        let quirks = &self.quirks;
        let commits_here =
            !quirks.webkit && !quirks.firefox_legacy && !quirks.ios && !quirks.wechat && !quirks.uc_mobile;
        if let Some(data) = data.filter(|d| commits_here && !d.is_empty()) {
            // Insert with the marks the user was looking at.
            let shown = self.state.pending_insertion_marks.take();
            let user = shown
                .as_ref()
                .map(|_| self.editor.pending_marks().cloned());
            if shown.is_some() {
                self.editor.set_pending_marks(shown);
            }
            let result = self.editor.insert_text(data);
            self.log_model("commit composition", result);
            if let Some(user) = user {
                self.editor.set_pending_marks(user);
            }
            self.flush_changes();
        }
        settle
    }

    /// The microtask after `compositionend` ran.
    pub fn composition_settled(&mut self) {
        self.set_composing(false);
    }
}
