use super::{element_count, Tensor};

impl<'de> serde::Deserialize<'de> for Tensor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        const FIELDS: &[&str] = &["shape", "data"];
        enum Field {
            Shape,
            Data,
        }

        impl<'de> serde::Deserialize<'de> for Field {
            fn deserialize<D>(deserializer: D) -> Result<Field, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                struct FieldVisitor;

                impl<'de> serde::de::Visitor<'de> for FieldVisitor {
                    type Value = Field;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        formatter.write_str("`shape` or `data`")
                    }

                    fn visit_str<E>(self, value: &str) -> Result<Field, E>
                    where
                        E: serde::de::Error,
                    {
                        match value {
                            "shape" => Ok(Field::Shape),
                            "data" => Ok(Field::Data),
                            _ => Err(serde::de::Error::unknown_field(value, FIELDS)),
                        }
                    }
                }

                deserializer.deserialize_identifier(FieldVisitor)
            }
        }

        // the data length must agree with the shape, otherwise indexing
        // would run past the buffer.
        fn checked<E>(shape: Vec<usize>, data: Vec<crate::Float>) -> Result<Tensor, E>
        where
            E: serde::de::Error,
        {
            let n = element_count(&shape);
            if data.len() != n {
                return Err(E::custom(format!(
                    "shape {shape:?} holds {n} elements but data has {}",
                    data.len()
                )));
            }
            Ok(Tensor { shape, data })
        }

        struct TensorVisitor;

        impl<'de> serde::de::Visitor<'de> for TensorVisitor {
            type Value = Tensor;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("struct Tensor")
            }

            fn visit_seq<V>(self, mut seq: V) -> Result<Tensor, V::Error>
            where
                V: serde::de::SeqAccess<'de>,
            {
                let shape = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let data = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                checked(shape, data)
            }

            fn visit_map<V>(self, mut map: V) -> Result<Tensor, V::Error>
            where
                V: serde::de::MapAccess<'de>,
            {
                let mut shape = None;
                let mut data = None;
                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Shape => {
                            if shape.is_some() {
                                return Err(serde::de::Error::duplicate_field("shape"));
                            }
                            shape = Some(map.next_value()?);
                        }
                        Field::Data => {
                            if data.is_some() {
                                return Err(serde::de::Error::duplicate_field("data"));
                            }
                            data = Some(map.next_value()?);
                        }
                    }
                }
                let shape = shape.ok_or_else(|| serde::de::Error::missing_field("shape"))?;
                let data = data.ok_or_else(|| serde::de::Error::missing_field("data"))?;
                checked(shape, data)
            }
        }

        deserializer.deserialize_struct("Tensor", FIELDS, TensorVisitor)
    }
}
