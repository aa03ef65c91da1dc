//! Activation function types.

use serde_derive::{Deserialize, Serialize};

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activator {
    /// Linear output, `f(z) = z`.
    Identity,
    /// Heaviside step, `f(z) = 1` for `z >= 0`, otherwise `0`.
    Step,
    /// Sigmoid function
    Sigmoid,
    /// Hyperbolic tan function
    TanH,
}

impl Activator {
    /// Evaluates `f(z)` for the selected the activation function.
    pub fn f(&self, z: f32) -> f32 {
        match self {
            Activator::Identity => identity(z),
            Activator::Step => step(z),
            Activator::Sigmoid => sigmoid(z),
            Activator::TanH => tanh(z),
        }
    }

    /// Evaluates the derivative `f'(z)`, where `z = f^{-1}(a)`.
    ///
    /// Note that this function takes in the *output* of the activation
    /// function, rather than the input. This is an optimization that means we
    /// don't have to store the intermediate results before activation.
    ///
    /// The step function reports a derivative of 1 everywhere, not its true
    /// derivative.
    pub fn fprime(&self, a: f32) -> f32 {
        match self {
            Activator::Identity | Activator::Step => unit(a),
            Activator::Sigmoid => sigmoid_prime(a),
            Activator::TanH => tanh_prime(a),
        }
    }

    /// Binds the activation to the function pair the kernels call.
    pub fn kernel(self) -> Kernel {
        let (f, fprime): (fn(f32) -> f32, fn(f32) -> f32) = match self {
            Activator::Identity => (identity, unit),
            Activator::Step => (step, unit),
            Activator::Sigmoid => (sigmoid, sigmoid_prime),
            Activator::TanH => (tanh, tanh_prime),
        };
        Kernel {
            activator: self,
            f,
            fprime,
        }
    }
}

/// An activation bound to its evaluation and derivative functions.
///
/// Layers bind their kernel once on construction.
#[derive(Copy, Clone, Debug)]
pub struct Kernel {
    activator: Activator,
    f: fn(f32) -> f32,
    fprime: fn(f32) -> f32,
}

impl Kernel {
    pub fn activator(&self) -> Activator {
        self.activator
    }

    /// Returns `(f(z), f'(f(z)))`.
    #[inline(always)]
    pub fn activate(&self, z: f32) -> (f32, f32) {
        let a = (self.f)(z);
        (a, (self.fprime)(a))
    }
}

fn identity(z: f32) -> f32 {
    z
}

fn unit(_: f32) -> f32 {
    1.0
}

fn step(z: f32) -> f32 {
    if z >= 0.0 {
        1.0
    } else {
        0.0
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

fn sigmoid_prime(a: f32) -> f32 {
    a * (1.0 - a)
}

fn tanh(z: f32) -> f32 {
    z.tanh()
}

fn tanh_prime(a: f32) -> f32 {
    1.0 - a * a
}
