// App layer: the console view wiring both presenters together.

pub mod console;
