/// Input and randomness
///
/// sread is the only place the engine blocks. When the host has no more
/// input the story stops as if it had executed quit.
use log::{debug, info, warn};

use crate::error::ZResult;
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};

/// Bytes per parse record: dictionary address word, length, position.
const PARSE_RECORD_SIZE: usize = 4;

impl Interpreter {
    pub(crate) fn op_sread(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let text_buffer = operand(ops, 0)? as usize;
        let parse_buffer = operand(ops, 1)? as usize;

        self.io().flush()?;
        let line = match self.io().read_line() {
            Ok(line) => line,
            Err(e) if e.is_end_of_input() => {
                info!("end of input, stopping");
                return Ok(ExecutionResult::Quit);
            }
            Err(e) => return Err(e.into()),
        };

        let capacity = (self.vm.read_byte(text_buffer)? as usize).saturating_sub(1);
        let mut input: String = line
            .to_lowercase()
            .chars()
            .map(|c| if c == '\t' { ' ' } else { c })
            .filter(|c| (' '..='~').contains(c))
            .collect();
        if input.len() > capacity {
            warn!("input truncated to {} characters", capacity);
            input.truncate(capacity);
        }
        debug!("sread {:?} into {:04x}/{:04x}", input, text_buffer, parse_buffer);

        for (i, b) in input.bytes().enumerate() {
            self.vm.write_byte(text_buffer + 1 + i, b)?;
        }
        self.vm.write_byte(text_buffer + 1 + input.len(), 0)?;

        let tokens = self.vm.dictionary.tokenise(&input);
        let max_words = self.vm.read_byte(parse_buffer)? as usize;
        if tokens.len() > max_words {
            warn!("{} words typed, parse buffer holds {}", tokens.len(), max_words);
        }
        let count = tokens.len().min(max_words);
        self.vm.write_byte(parse_buffer + 1, count as u8)?;
        for (i, token) in tokens.iter().take(count).enumerate() {
            let entry = self.vm.dictionary.lookup(&token.text).unwrap_or(0);
            let record = parse_buffer + 2 + i * PARSE_RECORD_SIZE;
            self.vm.write_word(record, entry as u16)?;
            self.vm.write_byte(record + 2, token.text.len() as u8)?;
            self.vm.write_byte(record + 3, (token.offset + 1) as u8)?;
        }
        Ok(ExecutionResult::Continue)
    }

    /// Positive n draws from [1, n]. Zero and negative n reseed and store 0.
    pub(crate) fn op_random(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let range = operand(ops, 0)? as i16;
        let value = if range > 0 {
            self.vm.rng.gen_range(range as u16)
        } else if range == 0 {
            self.vm.rng.reseed_from_clock();
            0
        } else {
            self.vm.rng.reseed(range.unsigned_abs() as u64);
            0
        };
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }
}
