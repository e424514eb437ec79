//! Procedural bodies: virtual procedures, update procedures and trigger actions.

use enum_as_inner::EnumAsInner;
use fedquery_common::data_type::DataTypeName;

use crate::Ident;
use crate::command::Command;
use crate::criteria::Criteria;
use crate::expression::Expression;
use crate::macros::{base, ext};
use crate::symbol::{ElementSymbol, GroupSymbol};

#[apply(ext)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn keyword(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }
}

#[apply(base)]
pub enum ProcedureKind {
    /// The body of a virtual stored procedure.
    Stored { name: Ident },
    /// An update procedure defining how a change to a virtual group is carried out.
    Update {
        virtual_group: GroupSymbol,
        event: TriggerEvent,
    },
}

/// `CREATE VIRTUAL PROCEDURE BEGIN ... END`
#[apply(base)]
pub struct CreateProcedureCommand {
    pub kind: ProcedureKind,
    pub block: Block,
    /// Columns of the last result-returning statement, set on resolution.
    pub result_columns: Vec<ElementSymbol>,
}

impl CreateProcedureCommand {
    pub fn stored(name: impl Into<Ident>, block: Block) -> Self {
        Self {
            kind: ProcedureKind::Stored { name: name.into() },
            block,
            result_columns: Vec::new(),
        }
    }

    pub fn update(virtual_group: GroupSymbol, event: TriggerEvent, block: Block) -> Self {
        Self {
            kind: ProcedureKind::Update {
                virtual_group,
                event,
            },
            block,
            result_columns: Vec::new(),
        }
    }
}

/// `FOR EACH ROW` action of an `INSTEAD OF` trigger on a view.
#[apply(base)]
pub struct TriggerAction {
    pub view: GroupSymbol,
    pub event: TriggerEvent,
    pub block: Block,
}

#[apply(base)]
#[derive(Default)]
pub struct Block {
    pub label: Option<Ident>,
    pub atomic: bool,
    pub statements: Vec<Statement>,
    /// Name of the group exposing the caught exception in `exception_statements`.
    pub exception_group: Option<Ident>,
    pub exception_statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            ..Self::default()
        }
    }

    pub fn labeled(label: impl Into<Ident>, statements: Vec<Statement>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(statements)
        }
    }
}

#[apply(base)]
#[derive(EnumAsInner)]
pub enum Statement {
    Declare(DeclareStatement),
    Assignment(AssignmentStatement),
    Command(CommandStatement),
    If(IfStatement),
    Loop(LoopStatement),
    While(WhileStatement),
    Block(Block),
    Raise(RaiseStatement),
    Return(ReturnStatement),
    Branch(BranchStatement),
}

impl Statement {
    pub fn declare(name: impl Into<Ident>, data_type: DataTypeName, value: Option<Expression>) -> Self {
        Statement::Declare(DeclareStatement {
            variable: ElementSymbol::new(name),
            data_type,
            value,
        })
    }

    pub fn assign(name: impl Into<Ident>, value: Expression) -> Self {
        Statement::Assignment(AssignmentStatement {
            variable: ElementSymbol::new(name),
            value,
        })
    }

    pub fn command(command: Command) -> Self {
        Statement::Command(CommandStatement {
            command: Box::new(command),
        })
    }
}

/// `DECLARE type name [= value];`
#[apply(base)]
pub struct DeclareStatement {
    pub variable: ElementSymbol,
    pub data_type: DataTypeName,
    pub value: Option<Expression>,
}

#[apply(base)]
pub struct AssignmentStatement {
    pub variable: ElementSymbol,
    pub value: Expression,
}

#[apply(base)]
pub struct CommandStatement {
    pub command: Box<Command>,
}

#[apply(base)]
pub struct IfStatement {
    pub condition: Criteria,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

/// `LOOP ON (command) AS cursor BEGIN ... END`
#[apply(base)]
pub struct LoopStatement {
    pub label: Option<Ident>,
    pub cursor: Ident,
    pub command: Box<Command>,
    pub block: Block,
}

#[apply(base)]
pub struct WhileStatement {
    pub label: Option<Ident>,
    pub condition: Criteria,
    pub block: Block,
}

#[apply(base)]
pub struct RaiseStatement {
    pub expression: Expression,
    pub warning: bool,
}

#[apply(base)]
pub struct ReturnStatement {
    pub expression: Option<Expression>,
}

#[apply(ext)]
pub enum BranchKind {
    Break,
    Continue,
    Leave,
}

impl BranchKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BranchKind::Break => "BREAK",
            BranchKind::Continue => "CONTINUE",
            BranchKind::Leave => "LEAVE",
        }
    }
}

#[apply(base)]
pub struct BranchStatement {
    pub kind: BranchKind,
    pub label: Option<Ident>,
}
