//! The evaluator.
//!
//! Evaluating an object dispatches on its tag: self-evaluating data
//! pushes, commands run their handler from the closed build-time table,
//! programs iterate their bodies, symbols resolve through locals and the
//! directory tree and evaluate their binding. Objects embedded in a
//! program body are copied out to fresh top-level objects before they
//! reach the stack, so the stack only ever holds whole heap objects.
//!
//! Top-level user actions run under undoable execution: a shallow stack
//! snapshot is taken first, errors roll back to it, and `undo` restores
//! the snapshot of the last successful action.

use stax_core::{object, Error, Interrupt, Result, Settings, Tag};
use stax_runtime::{ObjectId, Runtime};

use crate::{arith, loops};

/// The interpreter: runtime, settings and the shared interrupt flag.
pub struct Vm {
    pub rt: Runtime,
    pub settings: Settings,
    pub interrupt: Interrupt,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self {
            rt: Runtime::new(),
            settings: Settings::default(),
            interrupt: Interrupt::new(),
        }
    }

    /// Parse and evaluate one line of input as a user action. The line
    /// compiles to a program, so a delimited `« … »` in it pushes itself
    /// while bare commands execute.
    pub fn run_source(&mut self, text: &str) -> Result<()> {
        let id = stax_text::parse_program(&mut self.rt, text, &self.settings)?;
        self.run_action(id)
    }

    /// Evaluate an object as an undoable user action.
    pub fn run_action(&mut self, id: ObjectId) -> Result<()> {
        self.rt.save();
        match self.eval(id) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Roll the stack back to the pre-action snapshot.
                self.rt.restore();
                Err(e)
            }
        }
    }

    /// Undo the last successful user action.
    pub fn undo(&mut self) -> bool {
        self.rt.restore()
    }

    /// Render the object at stack level `depth` (0 = top).
    pub fn render_level(&self, depth: usize) -> Result<String> {
        let id = self.rt.peek(depth)?;
        stax_text::render(&self.rt, id, &self.settings)
    }

    // ========================================================================
    //   Core dispatch
    // ========================================================================

    /// Evaluate one heap object.
    pub fn eval(&mut self, id: ObjectId) -> Result<()> {
        let tag = self.rt.tag(id);
        if tag.is_command() {
            return self.exec_command(tag);
        }
        match tag {
            // Evaluating an expression runs its postfix body; symbols in
            // it resolve through the directory, operators through their
            // handlers. Programs run the same way.
            Tag::Program | Tag::Expression | Tag::Funcall => {
                let bytes = self.rt.object_vec(id);
                self.eval_body(object::body(&bytes)?)
            }
            Tag::Symbol => {
                let name = object::text_str(self.rt.bytes(id))?.to_string();
                self.eval_symbol(&name, id)
            }
            _ if tag.is_loop() => {
                let bytes = self.rt.object_vec(id);
                loops::eval_loop(self, &bytes)
            }
            _ => {
                self.rt.push(id);
                Ok(())
            }
        }
    }

    /// Evaluate a program body: each embedded object in order. Errors
    /// abort the remainder and propagate.
    pub fn eval_body(&mut self, body: &[u8]) -> Result<()> {
        for embedded in object::objects(body) {
            let embedded = embedded?;
            self.interrupt.check()?;
            self.eval_embedded(embedded)?;
        }
        Ok(())
    }

    /// Evaluate one object embedded in a larger body.
    pub fn eval_embedded(&mut self, embedded: &[u8]) -> Result<()> {
        let tag = object::tag_of(embedded)?;
        if tag.is_command() {
            return self.exec_command(tag);
        }
        if tag.is_loop() {
            return loops::eval_loop(self, embedded);
        }
        if tag == Tag::Symbol {
            let name = object::text_str(embedded)?.to_string();
            let id = self.rt.adopt(embedded)?;
            return self.eval_symbol(&name, id);
        }
        // Data (programs included: embedded programs push as data).
        let id = self.rt.adopt(embedded)?;
        self.rt.push(id);
        Ok(())
    }

    /// A symbol evaluates its binding when one exists, else stays put.
    fn eval_symbol(&mut self, name: &str, id: ObjectId) -> Result<()> {
        match self.rt.lookup(name) {
            Some(bound) => self.eval(bound),
            None => {
                self.rt.push(id);
                Ok(())
            }
        }
    }

    // ========================================================================
    //   Command handlers
    // ========================================================================

    fn exec_command(&mut self, tag: Tag) -> Result<()> {
        match tag {
            // Arithmetic
            Tag::Add | Tag::Sub | Tag::Mul | Tag::Div | Tag::Pow | Tag::Mod | Tag::Rem => {
                arith::binary(self, tag)
            }
            Tag::Neg | Tag::Inv | Tag::Sq | Tag::Sqrt | Tag::Abs | Tag::Sin | Tag::Cos
            | Tag::Tan | Tag::Exp | Tag::Ln => arith::unary(self, tag),
            Tag::Eq | Tag::Ne | Tag::Lt | Tag::Le | Tag::Gt | Tag::Ge => {
                arith::compare(self, tag)
            }
            Tag::And | Tag::Or | Tag::Xor => arith::logic(self, tag),
            Tag::Not => arith::not(self),

            // Stack
            Tag::Dup => self.rt.dup(),
            Tag::Drop => self.rt.drop_n(1),
            Tag::Swap => self.rt.swap(),
            Tag::Over => self.rt.over(),
            Tag::Rot => self.rt.rot(),
            Tag::Depth => {
                let depth = self.rt.depth() as i64;
                let id = self.rt.make_integer(depth)?;
                self.rt.push(id);
                Ok(())
            }
            Tag::Clear => {
                self.rt.clear_stack();
                Ok(())
            }
            Tag::Pick => {
                let n = self.pop_index()?;
                self.rt.pick(n)
            }
            Tag::Roll => {
                let n = self.pop_index()?;
                self.rt.roll(n)
            }

            // Directory
            Tag::Sto => {
                let name = self.pop_name()?;
                let value = self.rt.pop()?;
                self.rt.directory_mut().store(&name, value);
                Ok(())
            }
            Tag::Rcl => {
                let name = self.pop_name()?;
                let bound = self.rt.lookup(&name).ok_or(Error::UndefinedName)?;
                self.rt.push(bound);
                Ok(())
            }
            Tag::Purge => {
                let name = self.pop_name()?;
                self.rt.directory_mut().purge(&name);
                Ok(())
            }

            // Evaluation
            Tag::Eval => {
                let id = self.rt.pop()?;
                self.eval(id)
            }
            Tag::ToNum => {
                let id = self.rt.pop()?;
                self.to_num(id)
            }

            // Symbolic
            Tag::Expand | Tag::Collect | Tag::Simplify => self.normalize(tag),
            Tag::Rewrite => self.rewrite(),

            // Word size
            Tag::Stws => {
                let bits = self.pop_index()?;
                if bits == 0 || bits > 16384 {
                    return Err(Error::ValueOutOfRange);
                }
                self.settings.wordsize = bits as u32;
                Ok(())
            }
            Tag::Rcws => {
                let id = self.rt.make_integer(self.settings.wordsize as i64)?;
                self.rt.push(id);
                Ok(())
            }

            _ => Err(Error::Unimplemented),
        }
    }

    /// Pop a positive machine-sized integer (for pick, roll, stws).
    fn pop_index(&mut self) -> Result<usize> {
        let id = self.rt.pop()?;
        let value = stax_arith::read_int(&self.rt, id).map_err(|e| {
            self.rt.push(id);
            e
        })?;
        match value.to_i64() {
            Some(v) if v >= 0 => Ok(v as usize),
            _ => {
                self.rt.push(id);
                Err(Error::ValueOutOfRange)
            }
        }
    }

    /// Pop a name: a symbol, or an expression quoting a single symbol.
    fn pop_name(&mut self) -> Result<String> {
        let id = self.rt.pop()?;
        let bytes = self.rt.object_vec(id);
        let tag = object::tag_of(&bytes)?;
        let name = match tag {
            Tag::Symbol => Some(object::text_str(&bytes)?.to_string()),
            Tag::Expression => {
                let body = object::body(&bytes)?;
                match object::tag_of(body) {
                    Ok(Tag::Symbol) if object::size_of(body) == Ok(body.len()) => {
                        Some(object::text_str(body)?.to_string())
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        match name {
            Some(name) => Ok(name),
            None => {
                self.rt.push(id);
                Err(Error::TypeMismatch)
            }
        }
    }

    /// Numeric evaluation of an expression against the directory.
    fn to_num(&mut self, id: ObjectId) -> Result<()> {
        let tag = self.rt.tag(id);
        if tag.is_numeric() {
            self.rt.push(id);
            return Ok(());
        }
        if !matches!(tag, Tag::Expression | Tag::Funcall | Tag::Symbol) {
            self.rt.push(id);
            return Err(Error::TypeMismatch);
        }
        let before = self.rt.depth();
        self.eval(id)?;
        if self.rt.depth() != before + 1 {
            return Err(Error::TypeMismatch);
        }
        let result = self.rt.peek(0)?;
        if !self.rt.tag(result).is_numeric() {
            // Some name in the expression stayed symbolic.
            self.rt.drop_n(1)?;
            self.rt.push(id);
            return Err(Error::UndefinedName);
        }
        Ok(())
    }

    /// Expand/collect/simplify the expression on top of the stack.
    fn normalize(&mut self, tag: Tag) -> Result<()> {
        let id = self.rt.pop()?;
        let bytes = self.rt.object_vec(id);
        let body = match stax_symbolic::expr::quoted(&bytes) {
            Ok(body) => body,
            Err(e) => {
                self.rt.push(id);
                return Err(e);
            }
        };
        let result = match tag {
            Tag::Expand => stax_symbolic::expand(&body, &self.interrupt),
            Tag::Collect => stax_symbolic::collect(&body, &self.interrupt),
            Tag::Simplify => stax_symbolic::simplify(&body, &self.interrupt),
            _ => Err(Error::Unimplemented),
        };
        match result {
            Ok(new_body) => {
                let id = self.push_algebraic(&new_body)?;
                self.rt.push(id);
                Ok(())
            }
            Err(e) => {
                self.rt.push(id);
                Err(e)
            }
        }
    }

    /// `subject pattern template rewrite`: one bottom-up pass.
    fn rewrite(&mut self) -> Result<()> {
        let template = self.rt.pop()?;
        let pattern = self.rt.pop()?;
        let subject = self.rt.pop()?;
        let restore = |vm: &mut Vm| {
            vm.rt.push(subject);
            vm.rt.push(pattern);
            vm.rt.push(template);
        };

        let inner: Result<Vec<u8>> = (|| {
            let template_body = stax_symbolic::expr::quoted(&self.rt.object_vec(template))?;
            let pattern_body = stax_symbolic::expr::quoted(&self.rt.object_vec(pattern))?;
            let subject_body = stax_symbolic::expr::quoted(&self.rt.object_vec(subject))?;
            let rule = stax_symbolic::Rule::compile(pattern_body, template_body)?;
            let (result, _) = stax_symbolic::rewrite_once(&subject_body, &[rule])?;
            Ok(result)
        })();
        match inner {
            Ok(result) => {
                let id = self.push_algebraic(&result)?;
                self.rt.push(id);
                Ok(())
            }
            Err(e) => {
                restore(self);
                Err(e)
            }
        }
    }

    /// Intern a rewritten body: a lone numeric atom comes back as the
    /// bare number, everything else stays quoted as an expression.
    fn push_algebraic(&mut self, body: &[u8]) -> Result<ObjectId> {
        let lone_number = object::size_of(body) == Ok(body.len())
            && object::tag_of(body)?.is_numeric();
        if lone_number {
            self.rt.adopt(body)
        } else {
            stax_symbolic::make_expression(&mut self.rt, body)
        }
    }
}
