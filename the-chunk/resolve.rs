//! Evaluation of chunk expressions against a host.
//!
//! The engine owns no objects. Everything it looks up (stacks, cards,
//! controls, variables, properties) comes from the [`Host`] it borrows, and
//! every change it makes is handed back to the host through the same traits.
//!
//! Object resolution walks the container clauses from the outside in:
//! stacks, then the background or card, then groups and finally objects.
//! Each step scopes the next lookup. A value that names an object (a
//! variable holding `field 3`, say) is parsed again as a chunk, so
//! resolution can recurse; the depth of that recursion is bounded by
//! [`ChunkConfig::recursion_limit`].

use the_string::StringValue;
use tracing::{
  debug,
  trace,
};

use crate::{
  chunk::{
    Chunk,
    Destination,
  },
  config::ChunkConfig,
  cref::{
    Address,
    CRef,
    Ordinal,
  },
  error::{
    ChunkError,
    ResolutionErrorKind,
    Result,
  },
  expr::{
    BinaryOp,
    Expr,
  },
  granularity::{
    Granularity,
    ObjectKind,
  },
  parser,
  value::{
    Value,
    format_number,
  },
};

/// An object of the host's object space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// How a container clause picks its object among its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
  /// Zero based position.
  Index(usize),
  Id(u64),
  Name(StringValue),
}

/// The objects a chunk expression can name.
pub trait ObjectSpace {
  /// The current object of `kind`, for `this card` and for clauses left
  /// out of a chunk.
  fn this(&self, kind: Granularity) -> Option<ObjectHandle>;

  fn me(&self) -> Option<ObjectHandle>;

  fn target(&self) -> Option<ObjectHandle>;

  fn owner(&self, object: ObjectHandle) -> Option<ObjectHandle>;

  /// The child of `parent` that `lookup` picks. A `None` parent means the
  /// top level, where the stacks live. `parent_type` is the `card` or
  /// `background` written before an object kind, as in `bg field 1`.
  fn child(
    &self,
    parent: Option<ObjectHandle>,
    kind: Granularity,
    parent_type: Option<Granularity>,
    lookup: &Lookup,
  ) -> Option<ObjectHandle>;

  fn count(&self, parent: Option<ObjectHandle>, kind: Granularity) -> usize;

  /// The text an object holds, or `None` when it is not a container.
  fn text(&self, object: ObjectHandle) -> Option<StringValue>;

  /// Replaces the text of an object. Returns `false` when the object holds
  /// no text.
  fn set_text(&mut self, object: ObjectHandle, text: StringValue) -> bool;

  fn delete(&mut self, _object: ObjectHandle) -> bool {
    false
  }

  fn url(&self, _url: &str) -> Option<StringValue> {
    None
  }

  fn set_url(&mut self, _url: &str, _text: StringValue) -> bool {
    false
  }
}

/// Variables, properties and functions.
pub trait Evaluator {
  fn variable(&self, name: &str) -> Option<Value>;

  fn set_variable(&mut self, name: &str, value: Value);

  fn property(&mut self, name: &str, _of: Option<ObjectHandle>) -> Result<Value> {
    Err(ChunkError::evaluation(format!("unknown property {name}")))
  }

  fn call(&mut self, name: &str, _args: &[Value]) -> Result<Value> {
    Err(ChunkError::evaluation(format!("unknown function {name}")))
  }
}

pub trait Host: ObjectSpace + Evaluator {}

impl<T: ObjectSpace + Evaluator + ?Sized> Host for T {}

pub struct Engine<'h, H: Host + ?Sized> {
  pub(crate) host:   &'h mut H,
  pub(crate) config: ChunkConfig,
  rng:               u64,
  depth:             usize,
}

impl<'h, H: Host + ?Sized> Engine<'h, H> {
  pub fn new(host: &'h mut H, config: ChunkConfig) -> Self {
    let rng = config.random_seed.max(1);
    Self {
      host,
      config,
      rng,
      depth: 0,
    }
  }

  pub fn config(&self) -> &ChunkConfig {
    &self.config
  }

  pub fn host(&mut self) -> &mut H {
    self.host
  }

  /// A pseudo-random index below `bound` (xorshift64*), or zero for an
  /// empty range.
  pub(crate) fn random(&mut self, bound: usize) -> usize {
    if bound == 0 {
      return 0;
    }
    self.rng ^= self.rng >> 12;
    self.rng ^= self.rng << 25;
    self.rng ^= self.rng >> 27;
    let value = self.rng.wrapping_mul(0x2545_F491_4F6C_DD1D);
    (value % bound as u64) as usize
  }

  /// Runs `f` one level deeper, failing once the configured limit is
  /// reached.
  pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
    let limit = self.config.recursion_limit;
    if self.depth >= limit {
      return Err(ChunkError::RecursionLimit { limit });
    }
    self.depth += 1;
    trace!(depth = self.depth, "entering nested chunk");
    let result = f(self);
    self.depth -= 1;
    result
  }

  pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
    match expr {
      Expr::Text(text) => Ok(Value::Text(text.clone())),
      Expr::Number(number) => Ok(Value::Number(*number)),
      Expr::Variable(name) => match self.host.variable(name) {
        Some(value) => Ok(value),
        None => Ok(Value::Text(name.parse()?)),
      },
      Expr::Negate(inner) => {
        let value = self.nested(|engine| engine.evaluate(inner))?;
        self.expect_number(&value).map(|number| Value::Number(-number))
      },
      Expr::Binary { op, lhs, rhs } => {
        let lhs = self.nested(|engine| engine.evaluate(lhs))?;
        let rhs = self.nested(|engine| engine.evaluate(rhs))?;
        self.binary(*op, &lhs, &rhs)
      },
      Expr::Chunk(chunk) => self.nested(|engine| engine.get(chunk)),
      Expr::Property { name, of } => {
        let object = match of {
          Some(chunk) => Some(self.nested(|engine| engine.get_object(chunk))?),
          None => None,
        };
        self.host.property(name, object)
      },
      Expr::Function { name, args } => {
        let args = args
          .iter()
          .map(|arg| self.nested(|engine| engine.evaluate(arg)))
          .collect::<Result<Vec<_>>>()?;
        self.host.call(name, &args)
      },
      Expr::Count { kind, of } => {
        let count = self.nested(|engine| engine.count(*kind, of.as_deref()))?;
        Ok(Value::Number(count as f64))
      },
    }
  }

  fn binary(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    if !op.is_concat() {
      let lhs = self.expect_number(lhs)?;
      let rhs = self.expect_number(rhs)?;
      return op.arithmetic(lhs, rhs).map(Value::Number);
    }
    let mut out = self.value_text(lhs)?.mutable_copy();
    if op == BinaryOp::ConcatSpace {
      out.append_char(' ')?;
    }
    let rhs = self.value_text(rhs)?;
    out.append(&rhs)?;
    Ok(Value::Text(out.into_value()))
  }

  /// The text form of a value. Objects read as their text.
  pub fn value_text(&self, value: &Value) -> Result<StringValue> {
    match value {
      Value::Text(text) => Ok(text.clone()),
      Value::Number(number) => Ok(format_number(*number).parse()?),
      Value::Data(bytes) => Ok(StringValue::from_native_chars(bytes)?),
      Value::Object(object) => Ok(self.host.text(*object).unwrap_or_default()),
    }
  }

  pub fn value_number(&self, value: &Value) -> Option<f64> {
    match value {
      Value::Number(number) => Some(*number),
      Value::Text(text) => text.number(),
      Value::Data(_) | Value::Object(_) => None,
    }
  }

  fn expect_number(&self, value: &Value) -> Result<f64> {
    self
      .value_number(value)
      .ok_or_else(|| ChunkError::evaluation(format!("expected a number, got \"{value}\"")))
  }

  /// Resolves `chunk` to the object it names, ignoring any text clauses.
  pub fn get_object(&mut self, chunk: &Chunk) -> Result<ObjectHandle> {
    self.nested(|engine| engine.resolve_object(chunk))
  }

  /// Like [`Engine::get_object`], but an object that does not exist is
  /// `None` rather than an error.
  pub fn get_optional_object(&mut self, chunk: &Chunk) -> Result<Option<ObjectHandle>> {
    match self.get_object(chunk) {
      Ok(object) => Ok(Some(object)),
      Err(err) if err.is_resolution() => Ok(None),
      Err(err) => Err(err),
    }
  }

  fn resolve_object(&mut self, chunk: &Chunk) -> Result<ObjectHandle> {
    let root = self.root(chunk)?;
    if !chunk.has_containers() {
      return root.ok_or_else(|| missing(Granularity::Object(ObjectKind::Control)));
    }

    let mut scope = root;
    for cref in &chunk.stacks {
      scope = Some(self.resolve_clause(scope, cref)?);
    }
    let stack = scope;

    if let Some(cref) = &chunk.clip {
      let parent = self.scope_or_default(stack, Granularity::Stack)?;
      return self.resolve_clause(Some(parent), cref);
    }
    if let Some(cref) = &chunk.background {
      let parent = self.scope_or_default(scope, Granularity::Stack)?;
      scope = Some(self.resolve_clause(Some(parent), cref)?);
    }
    if let Some(cref) = &chunk.card {
      let parent = self.scope_or_default(scope, Granularity::Stack)?;
      scope = Some(self.resolve_clause(Some(parent), cref)?);
    }

    let explicit_card = chunk.card.is_some() || chunk.background.is_some();
    for cref in chunk.groups.iter().chain(&chunk.objects) {
      let parent = self.scope_or_default(scope, Granularity::Card)?;
      let found = match self.resolve_clause(Some(parent), cref) {
        Err(err) if err.is_resolution() && !explicit_card && matches!(cref.address, Address::Id(_)) => {
          // Ids are unique across the stack, so an object that is not on
          // the card may still be found on the stack.
          let stack = self.scope_or_default(stack, Granularity::Stack)?;
          trace!(clause = cref.kind.name(), "searching the stack by id");
          self.resolve_clause(Some(stack), cref)?
        },
        result => result?,
      };
      scope = Some(found);
    }

    scope.ok_or_else(|| missing(Granularity::Stack))
  }

  /// The object the destination names, if the chunk has one.
  fn root(&mut self, chunk: &Chunk) -> Result<Option<ObjectHandle>> {
    let control = Granularity::Object(ObjectKind::Control);
    match &chunk.destination {
      Destination::Containers => Ok(None),
      Destination::Me => self.host.me().map(Some).ok_or_else(|| missing(control)),
      Destination::Target => self.host.target().map(Some).ok_or_else(|| missing(control)),
      Destination::OwnerOf(inner) => {
        let object = self.get_object(inner)?;
        self.host.owner(object).map(Some).ok_or_else(|| missing(control))
      },
      Destination::Nested(inner) => self.get_object(inner).map(Some),
      Destination::Url(_) => Err(ChunkError::Resolution {
        kind:   ResolutionErrorKind::ObjectNotContainer,
        clause: Granularity::Url,
      }),
      Destination::Variable(_) | Destination::Expression(_) => {
        let value = match &chunk.destination {
          Destination::Variable(name) => self.host.variable(name).unwrap_or_default(),
          Destination::Expression(expr) => self.evaluate(expr)?,
          _ => Value::empty(),
        };
        if let Value::Object(object) = value {
          return Ok(Some(object));
        }
        let source = self.value_text(&value)?.to_string();
        debug!(%source, "re-parsing value as a chunk");
        let reparsed = parser::parse(&source).map_err(|err| match err {
          ChunkError::RecursionLimit { .. } => err,
          _ => missing(control),
        })?;
        self.get_object(&reparsed).map(Some)
      },
    }
  }

  fn scope_or_default(
    &self,
    scope: Option<ObjectHandle>,
    kind: Granularity,
  ) -> Result<ObjectHandle> {
    match scope {
      Some(scope) => Ok(scope),
      None => self.host.this(kind).ok_or_else(|| missing(kind)),
    }
  }

  fn resolve_clause(&mut self, parent: Option<ObjectHandle>, cref: &CRef) -> Result<ObjectHandle> {
    let lookup = match &cref.address {
      Address::This => return self.host.this(cref.kind).ok_or_else(|| missing(cref.kind)),
      Address::Ordinal(ordinal) => {
        let count = self.host.count(parent, cref.kind);
        if count == 0 {
          return Err(missing(cref.kind));
        }
        Lookup::Index(self.ordinal_index(*ordinal, count))
      },
      Address::Id(expr) => {
        let value = self.evaluate(expr)?;
        match self.value_number(&value) {
          Some(id) if id >= 0.0 && id.fract() == 0.0 => Lookup::Id(id as u64),
          _ => return Err(missing(cref.kind)),
        }
      },
      Address::Expression(expr) => {
        let value = self.evaluate(expr)?;
        match self.value_number(&value) {
          Some(number) if number >= 1.0 && number.fract() == 0.0 => {
            Lookup::Index(number as usize - 1)
          },
          Some(number) if number.fract() == 0.0 => return Err(missing(cref.kind)),
          _ => Lookup::Name(self.value_text(&value)?),
        }
      },
      Address::Range { .. } => return Err(missing(cref.kind)),
    };

    self
      .host
      .child(parent, cref.kind, cref.parent, &lookup)
      .ok_or_else(|| missing(cref.kind))
  }

  /// Zero based index an ordinal picks among `count` elements.
  pub(crate) fn ordinal_index(&mut self, ordinal: Ordinal, count: usize) -> usize {
    match ordinal {
      Ordinal::Nth(nth) => nth as usize,
      Ordinal::Last => count.saturating_sub(1),
      Ordinal::Middle => count / 2,
      Ordinal::Any => self.random(count),
    }
  }
}

/// The resolution failure for a clause of `kind` that names nothing.
pub(crate) fn missing(kind: Granularity) -> ChunkError {
  let error = match kind {
    Granularity::Stack => ResolutionErrorKind::NoSuchStack,
    Granularity::Background => ResolutionErrorKind::NoSuchBackground,
    Granularity::Card => ResolutionErrorKind::NoSuchCard,
    _ => ResolutionErrorKind::NoSuchObject,
  };
  ChunkError::Resolution {
    kind:   error,
    clause: kind,
  }
}
