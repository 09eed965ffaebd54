#[cfg(test)]
mod token_buffer_tests {
    use haw_script as haw;

    use haw::error::ScriptError;
    use haw::token::*;
    use haw::token_buffer::*;

    /// Form and finalise one token holding `text`.
    fn push_token(buffer: &mut TokenBuffer, text: &str, line: usize) {
        buffer.new_token(line);
        for c in text.chars() {
            buffer.append_char(c);
        }
        buffer.set_type(TokenType::IDENTIFIER);
        buffer.end_token();
    }

    #[test]
    fn test_tokens_share_one_pool() {
        let mut buffer = TokenBuffer::new();

        push_token(&mut buffer, "alpha", 1);
        push_token(&mut buffer, "beta", 1);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.pool_count(), 1);
        assert_eq!(buffer.str(buffer.at(0).unwrap()), "alpha");
        assert_eq!(buffer.str(buffer.at(1).unwrap()), "beta");
        assert_eq!(buffer.at(1).unwrap().begin(), 5);
    }

    #[test]
    fn test_overflowing_token_relocates_to_new_pool() {
        let mut buffer = TokenBuffer::new();
        let first = "x".repeat(1000);
        let second = "y".repeat(30);

        push_token(&mut buffer, &first, 1);
        push_token(&mut buffer, &second, 2);

        assert_eq!(buffer.pool_count(), 2);

        let token = buffer.at(1).unwrap();
        assert_eq!(token.pool(), 1);
        assert_eq!(token.begin(), 0);
        assert_eq!(token.line(), 2);
        assert_eq!(buffer.str(token), second);

        // The earlier token is untouched by the move.
        assert_eq!(buffer.str(buffer.at(0).unwrap()), first);
    }

    #[test]
    fn test_oversized_token_enlarges_empty_pool() {
        let mut buffer = TokenBuffer::new();
        let text = "z".repeat(POOL_SIZE + 500);

        push_token(&mut buffer, &text, 1);

        assert_eq!(buffer.pool_count(), 1);
        assert_eq!(buffer.str(buffer.at(0).unwrap()), text);
    }

    #[test]
    fn test_token_survives_repeated_relocation() {
        let mut buffer = TokenBuffer::new();
        let long = "q".repeat(20_000);

        push_token(&mut buffer, "aa", 1);
        push_token(&mut buffer, &long, 2);
        push_token(&mut buffer, "tail", 3);

        // Moved once to a fresh pool, then grown in place there.
        assert_eq!(buffer.pool_count(), 2);
        assert_eq!(buffer.at(1).unwrap().pool(), 1);
        assert_eq!(buffer.at(1).unwrap().begin(), 0);

        assert_eq!(buffer.str(buffer.at(0).unwrap()), "aa");
        assert_eq!(buffer.str(buffer.at(1).unwrap()), long);
        assert_eq!(buffer.str(buffer.at(2).unwrap()), "tail");
        assert_eq!(buffer.at(2).unwrap().begin(), 20_000);
    }

    #[test]
    fn test_multibyte_text_survives_relocation() {
        let mut buffer = TokenBuffer::new();
        let text = "é".repeat(700);

        push_token(&mut buffer, "head", 1);
        push_token(&mut buffer, &text, 1);

        assert_eq!(buffer.str(buffer.at(0).unwrap()), "head");
        assert_eq!(buffer.str(buffer.at(1).unwrap()), text);
    }

    #[test]
    fn test_clear_keeps_pools_for_reuse() {
        let mut buffer = TokenBuffer::new();

        push_token(&mut buffer, &"x".repeat(1000), 1);
        push_token(&mut buffer, &"y".repeat(100), 1);
        assert_eq!(buffer.pool_count(), 2);

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.pool_count(), 2);

        push_token(&mut buffer, "again", 3);

        let token = buffer.at(0).unwrap();
        assert_eq!(token.pool(), 0);
        assert_eq!(token.begin(), 0);
        assert_eq!(buffer.str(token), "again");
    }

    #[test]
    fn test_new_token_restarts_forming_token() {
        let mut buffer = TokenBuffer::new();

        buffer.new_token(1);
        buffer.append_char('a');
        buffer.append_char('b');
        buffer.new_token(2);
        buffer.append_char('c');
        buffer.set_type(TokenType::OPERATOR);
        buffer.end_token();

        assert_eq!(buffer.len(), 1);

        let token = buffer.latest().unwrap();
        assert_eq!(buffer.str(token), "c");
        assert_eq!(token.line(), 2);
        assert_eq!(token.token_type(), TokenType::OPERATOR);
    }

    #[test]
    fn test_forming_token_is_not_counted() {
        let mut buffer = TokenBuffer::new();

        push_token(&mut buffer, "done", 1);
        buffer.new_token(1);
        buffer.append_char('p');

        assert!(buffer.is_forming());
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.tokens().len(), 1);
        assert_eq!(buffer.str(buffer.forming().unwrap()), "p");
        assert!(buffer.at(1).is_err());
    }

    #[test]
    fn test_at_out_of_range() {
        let mut buffer = TokenBuffer::new();

        push_token(&mut buffer, "only", 1);

        match buffer.at(5) {
            Err(ScriptError::OutOfRange { index, size, .. }) => {
                assert_eq!(index, 5);
                assert_eq!(size, 1);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }
}
