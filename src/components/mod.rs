pub mod effect_canvas;
