//! Scripted engine for driving the orchestrator without a real solver.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use quibble_nlp::{
    Engine, EngineHandle, EngineOutput, InvokeArgs, Nlp, NlpError, ReturnStatus, SolverOptions,
};

/// Replays `script` in order, one output per invocation, and records every
/// guess it receives. Once the script runs out the last output repeats.
#[derive(Clone)]
pub struct ScriptedEngine {
    script: Vec<EngineOutput>,
    guesses: Rc<RefCell<Vec<Vec<f64>>>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<EngineOutput>) -> Self {
        Self {
            script,
            guesses: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn guesses(&self) -> Vec<Vec<f64>> {
        self.guesses.borrow().clone()
    }
}

struct ScriptedHandle {
    script: Vec<EngineOutput>,
    guesses: Rc<RefCell<Vec<Vec<f64>>>>,
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn instantiate(
        &self,
        _nlp: &Nlp,
        _options: &SolverOptions,
    ) -> Result<Box<dyn EngineHandle>, NlpError> {
        Ok(Box::new(ScriptedHandle {
            script: self.script.clone(),
            guesses: Rc::clone(&self.guesses),
        }))
    }
}

impl EngineHandle for ScriptedHandle {
    fn invoke(&mut self, args: &InvokeArgs<'_>) -> EngineOutput {
        let mut guesses = self.guesses.borrow_mut();
        let index = guesses.len().min(self.script.len() - 1);
        guesses.push(args.x0.to_vec());
        self.script[index].clone()
    }
}

pub fn success(x: &[f64], f: f64) -> EngineOutput {
    EngineOutput {
        x: x.to_vec(),
        lam_x: vec![0.0; x.len()],
        lam_g: Vec::new(),
        f,
        g: Vec::new(),
        success: true,
        status: ReturnStatus::SolveSucceeded,
        iterations: 1,
    }
}

pub fn failure(x: &[f64], lam_x: &[f64]) -> EngineOutput {
    EngineOutput {
        x: x.to_vec(),
        lam_x: lam_x.to_vec(),
        lam_g: Vec::new(),
        f: f64::NAN,
        g: Vec::new(),
        success: false,
        status: ReturnStatus::InfeasibleProblemDetected,
        iterations: 1,
    }
}
