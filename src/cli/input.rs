/// Minimal single-line editor backing the form's text fields.
#[derive(Debug, Default, Clone)]
pub struct LineEdit {
    value: String,
    // Byte offset, kept on a char boundary.
    cursor: usize,
}

impl LineEdit {
    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        self.cursor = self.value.len();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn push(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.value.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Value with a caret at the cursor position when the field is active.
    pub fn rendered(&self, active: bool) -> String {
        if active {
            format!("{}▏{}", &self.value[..self.cursor], &self.value[self.cursor..])
        } else {
            self.value.clone()
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.value[..self.cursor].char_indices().last().map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_the_cursor() {
        let mut edit = LineEdit::default();
        edit.push('a');
        edit.push('c');
        edit.left();
        edit.push('b');
        assert_eq!(edit.value(), "abc");

        edit.backspace();
        assert_eq!(edit.value(), "ac");

        edit.right();
        edit.push('!');
        assert_eq!(edit.value(), "ac!");
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut edit = LineEdit::default();
        edit.push('é');
        edit.push('€');
        edit.left();
        edit.backspace();
        assert_eq!(edit.value(), "€");
        edit.right();
        edit.push('x');
        assert_eq!(edit.value(), "€x");
    }

    #[test]
    fn set_moves_the_cursor_to_the_end() {
        let mut edit = LineEdit::default();
        edit.set("12.50");
        edit.push('0');
        assert_eq!(edit.value(), "12.500");
        edit.clear();
        assert_eq!(edit.value(), "");
    }
}
